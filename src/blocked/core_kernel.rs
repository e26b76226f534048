//! Per-core tiled kernel.

use std::ops::Range;

use crate::config::Isa;
use crate::kernels::lanes::{F32Lanes, Portable};
use crate::kernels::tile::AccTile;
use crate::matrix::view::{ColMajor, ColumnBlockMut, RowMajor};

#[cfg(target_arch = "x86_64")]
use crate::kernels::lanes::{Avx2, Avx512};

/// How a tile's accumulators start on the first reduction block of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccInit {
    /// Start from zero: this call owns the whole reduction for its region.
    Zero,
    /// Start from what Res already holds: an earlier call covered the
    /// preceding reduction blocks.
    Load,
}

/// A monomorphized core kernel.
///
/// Arguments: A, W, the output block this unit owns, the reduction range,
/// `i_cache`, and the accumulator policy for the first reduction block.
///
/// # Safety
///
/// The CPU must support the instruction set the kernel was selected for.
/// The batch count must be a multiple of the tile height, the block's column
/// count a multiple of the tile width, and the reduction range must lie in
/// `0..I`.
pub type CoreFn =
    unsafe fn(ColMajor<'_>, RowMajor<'_>, &mut ColumnBlockMut<'_>, Range<usize>, usize, AccInit);

/// Computes `Res[:, block] (+)= A^T[:, reduction] · W[reduction, block]`.
///
/// Loop nest, outermost first:
/// 1. reduction blocks of `i_cache` indices
/// 2. output blocks of `C * LANES` columns
/// 3. batch blocks of `R` rows: one accumulator tile
/// 4. each reduction index: load W once, broadcast `R` values of A, FMA
///
/// The tile is stored after every reduction block and reloaded for the
/// next, so a full reduction yields the same bits as one uninterrupted
/// FMA chain.
#[inline(always)]
unsafe fn core_kernel<V: F32Lanes, const R: usize, const C: usize>(
    a: ColMajor<'_>,
    w: RowMajor<'_>,
    out: &mut ColumnBlockMut<'_>,
    reduction: Range<usize>,
    i_cache: usize,
    init: AccInit,
) {
    let width = AccTile::<V, R, C>::WIDTH;
    let batch = a.rows();
    let columns = out.columns();

    debug_assert_eq!(batch % R, 0);
    debug_assert_eq!(columns.len() % width, 0);
    debug_assert!(reduction.end <= a.cols());

    for (n, i0) in reduction.clone().step_by(i_cache).enumerate() {
        let i1 = (i0 + i_cache).min(reduction.end);
        let fresh = n == 0 && init == AccInit::Zero;

        for o0 in columns.clone().step_by(width) {
            for b0 in (0..batch).step_by(R) {
                let mut tile = if fresh {
                    unsafe { AccTile::<V, R, C>::zero() }
                } else {
                    unsafe { AccTile::<V, R, C>::load(out, b0, o0) }
                };

                for i in i0..i1 {
                    let a_col = &a.column(i)[b0..b0 + R];
                    let w_row = &w.row(i)[o0..o0 + width];
                    unsafe { tile.fma(a_col, w_row) };
                }

                unsafe { tile.store(out, b0, o0) };
            }
        }
    }
}

unsafe fn core_portable<const R: usize, const C: usize>(
    a: ColMajor<'_>,
    w: RowMajor<'_>,
    out: &mut ColumnBlockMut<'_>,
    reduction: Range<usize>,
    i_cache: usize,
    init: AccInit,
) {
    unsafe { core_kernel::<Portable, R, C>(a, w, out, reduction, i_cache, init) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn core_avx2<const R: usize, const C: usize>(
    a: ColMajor<'_>,
    w: RowMajor<'_>,
    out: &mut ColumnBlockMut<'_>,
    reduction: Range<usize>,
    i_cache: usize,
    init: AccInit,
) {
    unsafe { core_kernel::<Avx2, R, C>(a, w, out, reduction, i_cache, init) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f,fma")]
unsafe fn core_avx512<const R: usize, const C: usize>(
    a: ColMajor<'_>,
    w: RowMajor<'_>,
    out: &mut ColumnBlockMut<'_>,
    reduction: Range<usize>,
    i_cache: usize,
    init: AccInit,
) {
    unsafe { core_kernel::<Avx512, R, C>(a, w, out, reduction, i_cache, init) }
}

/// Tile shapes with a compiled kernel: `b_cache` in {1,2,4,8,16,32} by
/// {1,2,4} vectors, at most 32 accumulators.
macro_rules! tile_shapes {
    ($kernel:ident, $rows:expr, $vectors:expr) => {
        match ($rows, $vectors) {
            (1, 1) => Some($kernel::<1, 1> as CoreFn),
            (1, 2) => Some($kernel::<1, 2> as CoreFn),
            (1, 4) => Some($kernel::<1, 4> as CoreFn),
            (2, 1) => Some($kernel::<2, 1> as CoreFn),
            (2, 2) => Some($kernel::<2, 2> as CoreFn),
            (2, 4) => Some($kernel::<2, 4> as CoreFn),
            (4, 1) => Some($kernel::<4, 1> as CoreFn),
            (4, 2) => Some($kernel::<4, 2> as CoreFn),
            (4, 4) => Some($kernel::<4, 4> as CoreFn),
            (8, 1) => Some($kernel::<8, 1> as CoreFn),
            (8, 2) => Some($kernel::<8, 2> as CoreFn),
            (8, 4) => Some($kernel::<8, 4> as CoreFn),
            (16, 1) => Some($kernel::<16, 1> as CoreFn),
            (16, 2) => Some($kernel::<16, 2> as CoreFn),
            (32, 1) => Some($kernel::<32, 1> as CoreFn),
            _ => None,
        }
    };
}

/// Looks up the kernel for `isa` with a `rows × vectors` accumulator tile.
pub fn select_kernel(isa: Isa, rows: usize, vectors: usize) -> Option<CoreFn> {
    match isa {
        Isa::Portable => tile_shapes!(core_portable, rows, vectors),
        #[cfg(target_arch = "x86_64")]
        Isa::Avx2 => tile_shapes!(core_avx2, rows, vectors),
        #[cfg(target_arch = "x86_64")]
        Isa::Avx512 => tile_shapes!(core_avx512, rows, vectors),
        #[cfg(not(target_arch = "x86_64"))]
        Isa::Avx2 | Isa::Avx512 => None,
    }
}
