//! Layout-aware views over flat `f32` buffers.
//!
//! A is column-major, W and Res are row-major. The offset formula for each
//! layout lives here and nowhere else, so the tiled kernel and the reference
//! cannot disagree on which index is which.

use std::marker::PhantomData;
use std::ops::Range;
use std::ptr::NonNull;
use std::slice;

use crate::error::{MatmulError, Result};

pub(crate) fn check_len(name: &'static str, got: usize, rows: usize, cols: usize) -> Result<()> {
    let expected = rows
        .checked_mul(cols)
        .ok_or(MatmulError::Overflow { name, rows, cols })?;
    if got != expected {
        return Err(MatmulError::ShapeMismatch {
            name,
            expected,
            got,
        });
    }
    Ok(())
}

/// Read-only column-major `rows × cols` matrix: `(r, c)` lives at `c * rows + r`.
#[derive(Debug, Clone, Copy)]
pub struct ColMajor<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> ColMajor<'a> {
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        check_len("column-major matrix", data.len(), rows, cols)?;
        Ok(ColMajor { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[col * self.rows + row]
    }

    /// Column `col`, contiguous over all rows.
    #[inline]
    pub fn column(&self, col: usize) -> &'a [f32] {
        let start = col * self.rows;
        &self.data[start..start + self.rows]
    }
}

/// Read-only row-major `rows × cols` matrix: `(r, c)` lives at `r * cols + c`.
#[derive(Debug, Clone, Copy)]
pub struct RowMajor<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
}

impl<'a> RowMajor<'a> {
    pub fn new(data: &'a [f32], rows: usize, cols: usize) -> Result<Self> {
        check_len("row-major matrix", data.len(), rows, cols)?;
        Ok(RowMajor { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Row `row`, contiguous over all columns.
    #[inline]
    pub fn row(&self, row: usize) -> &'a [f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }
}

/// Exclusively borrowed row-major output matrix.
#[derive(Debug)]
pub struct RowMajorMut<'a> {
    data: &'a mut [f32],
    rows: usize,
    cols: usize,
}

impl<'a> RowMajorMut<'a> {
    pub fn new(data: &'a mut [f32], rows: usize, cols: usize) -> Result<Self> {
        check_len("row-major output", data.len(), rows, cols)?;
        Ok(RowMajorMut { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        self.data
    }

    /// Hands out one mutable block per column range.
    ///
    /// The ranges must be ascending, non-overlapping and inside `0..cols`,
    /// which is what lets each block be sent to a different worker.
    ///
    /// # Panics
    ///
    /// Panics if two ranges overlap, are out of order, or run past the last
    /// column.
    pub fn split_columns(&mut self, ranges: &[Range<usize>]) -> Vec<ColumnBlockMut<'_>> {
        let mut prev_end = 0;
        for r in ranges {
            assert!(
                prev_end <= r.start && r.start <= r.end && r.end <= self.cols,
                "column ranges must be ascending and disjoint within 0..{}: {:?}",
                self.cols,
                ranges
            );
            prev_end = r.end;
        }

        let base = NonNull::from(&mut *self.data).cast::<f32>();
        ranges
            .iter()
            .map(|r| ColumnBlockMut {
                base,
                rows: self.rows,
                stride: self.cols,
                cols: r.clone(),
                _marker: PhantomData,
            })
            .collect()
    }
}

/// Columns `cols` of every row of a row-major output, owned by one worker.
///
/// Blocks produced by one [`RowMajorMut::split_columns`] call never share a
/// column, so they can be written concurrently.
#[derive(Debug)]
pub struct ColumnBlockMut<'a> {
    base: NonNull<f32>,
    rows: usize,
    stride: usize,
    cols: Range<usize>,
    _marker: PhantomData<&'a mut [f32]>,
}

// SAFETY: a block only ever touches its own column range of a buffer that is
// exclusively borrowed for `'a`; sibling blocks have disjoint ranges.
unsafe impl Send for ColumnBlockMut<'_> {}

impl ColumnBlockMut<'_> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> Range<usize> {
        self.cols.clone()
    }

    #[inline]
    fn check_segment(&self, row: usize, col: usize, len: usize) {
        assert!(
            row < self.rows && col >= self.cols.start && col + len <= self.cols.end,
            "segment row {} cols {}..{} outside block {:?} x 0..{}",
            row,
            col,
            col + len,
            self.cols,
            self.rows
        );
    }

    /// `len` values of row `row` starting at absolute column `col`.
    #[inline]
    pub fn segment(&self, row: usize, col: usize, len: usize) -> &[f32] {
        self.check_segment(row, col, len);
        // SAFETY: bounds checked above; the range belongs to this block.
        unsafe { slice::from_raw_parts(self.base.as_ptr().add(row * self.stride + col), len) }
    }

    #[inline]
    pub fn segment_mut(&mut self, row: usize, col: usize, len: usize) -> &mut [f32] {
        self.check_segment(row, col, len);
        // SAFETY: bounds checked above; no other block can reach these columns
        // and `&mut self` rules out a second live slice from this one.
        unsafe { slice::from_raw_parts_mut(self.base.as_ptr().add(row * self.stride + col), len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_major_offsets() {
        // 2×3, column-major
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let a = ColMajor::new(&data, 2, 3).unwrap();
        assert_eq!(a.get(0, 0), 1.0);
        assert_eq!(a.get(1, 0), 2.0);
        assert_eq!(a.get(0, 2), 5.0);
        assert_eq!(a.column(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_row_major_offsets() {
        // 2×3, row-major
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let w = RowMajor::new(&data, 2, 3).unwrap();
        assert_eq!(w.get(0, 2), 3.0);
        assert_eq!(w.get(1, 0), 4.0);
        assert_eq!(w.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let data = [0.0; 5];
        assert!(matches!(
            ColMajor::new(&data, 2, 3),
            Err(MatmulError::ShapeMismatch {
                expected: 6,
                got: 5,
                ..
            })
        ));
    }

    #[test]
    fn test_element_count_overflow() {
        let data = [0.0; 8];
        assert!(matches!(
            RowMajor::new(&data, usize::MAX / 4, 8),
            Err(MatmulError::Overflow { rows, cols: 8, .. }) if rows == usize::MAX / 4
        ));
    }

    #[test]
    fn test_split_columns_writes_land_in_place() {
        let mut data = vec![0.0; 2 * 8];
        let mut res = RowMajorMut::new(&mut data, 2, 8).unwrap();
        {
            let mut blocks = res.split_columns(&[0..4, 4..8]);
            let (left, right) = blocks.split_at_mut(1);
            left[0].segment_mut(1, 2, 2).copy_from_slice(&[1.0, 2.0]);
            right[0].segment_mut(0, 4, 4).copy_from_slice(&[3.0; 4]);
            assert_eq!(right[0].segment(0, 5, 1), &[3.0]);
        }
        assert_eq!(res.get(1, 2), 1.0);
        assert_eq!(res.get(1, 3), 2.0);
        assert_eq!(&res.as_slice()[4..8], &[3.0; 4]);
        assert_eq!(res.get(1, 4), 0.0);
    }

    #[test]
    #[should_panic(expected = "ascending and disjoint")]
    fn test_split_columns_rejects_overlap() {
        let mut data = vec![0.0; 8];
        let mut res = RowMajorMut::new(&mut data, 1, 8).unwrap();
        let _ = res.split_columns(&[0..5, 4..8]);
    }

    #[test]
    #[should_panic(expected = "outside block")]
    fn test_segment_outside_block_panics() {
        let mut data = vec![0.0; 8];
        let mut res = RowMajorMut::new(&mut data, 1, 8).unwrap();
        let mut blocks = res.split_columns(&[0..4, 4..8]);
        let _ = blocks[0].segment_mut(0, 2, 4);
    }
}
