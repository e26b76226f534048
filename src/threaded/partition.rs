use std::ops::Range;

/// Splits `0..total` into contiguous ranges of `width` columns.
///
/// The ranges are ascending and disjoint and their union is exactly
/// `0..total`, which is what [`RowMajorMut::split_columns`] needs to hand
/// one block to each worker.
///
/// # Panics
///
/// Panics if `width` is zero or doesn't divide `total`. The configuration
/// check rejects both before dispatch.
///
/// [`RowMajorMut::split_columns`]: crate::matrix::view::RowMajorMut::split_columns
pub fn column_ranges(total: usize, width: usize) -> Vec<Range<usize>> {
    assert!(
        width > 0 && total % width == 0,
        "{} columns can't be split into blocks of {}",
        total,
        width
    );
    (0..total).step_by(width).map(|start| start..start + width).collect()
}

/// Per-worker output slices for the output-partition strategy.
pub fn per_worker(output: usize, threads: usize) -> Vec<Range<usize>> {
    column_ranges(output, output / threads)
}

/// Per-tile output blocks for the reduction-blocked strategy.
pub fn per_block(output: usize, o_cache: usize) -> Vec<Range<usize>> {
    column_ranges(output, o_cache)
}
