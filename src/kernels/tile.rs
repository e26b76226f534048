//! Register-resident accumulator tile.

use super::lanes::F32Lanes;
use crate::matrix::view::ColumnBlockMut;

/// `R × C` vector accumulators: partial sums for `R` output rows by
/// `C * V::LANES` output columns.
///
/// `R * C` must fit the vector register file or the tile spills to the
/// stack; the configuration check enforces that before any tile exists.
#[derive(Clone, Copy)]
pub struct AccTile<V: F32Lanes, const R: usize, const C: usize> {
    acc: [[V; C]; R],
}

impl<V: F32Lanes, const R: usize, const C: usize> AccTile<V, R, C> {
    /// Output columns covered by one tile.
    pub const WIDTH: usize = C * V::LANES;

    /// # Safety
    ///
    /// The CPU must support `V`'s instruction set.
    #[inline(always)]
    pub unsafe fn zero() -> Self {
        let z = unsafe { V::zero() };
        AccTile { acc: [[z; C]; R] }
    }

    /// Reads the partial sums already stored for rows `b0..b0+R`, columns
    /// `o0..o0+WIDTH`.
    ///
    /// # Safety
    ///
    /// The CPU must support `V`'s instruction set.
    #[inline(always)]
    pub unsafe fn load(out: &ColumnBlockMut<'_>, b0: usize, o0: usize) -> Self {
        let mut tile = unsafe { Self::zero() };
        for (r, row) in tile.acc.iter_mut().enumerate() {
            let src = out.segment(b0 + r, o0, Self::WIDTH);
            for (c, v) in row.iter_mut().enumerate() {
                *v = unsafe { V::load(src.as_ptr().add(c * V::LANES)) };
            }
        }
        tile
    }

    /// Writes the tile back over rows `b0..b0+R`, columns `o0..o0+WIDTH`.
    ///
    /// # Safety
    ///
    /// The CPU must support `V`'s instruction set.
    #[inline(always)]
    pub unsafe fn store(&self, out: &mut ColumnBlockMut<'_>, b0: usize, o0: usize) {
        for (r, row) in self.acc.iter().enumerate() {
            let dst = out.segment_mut(b0 + r, o0, Self::WIDTH);
            for (c, v) in row.iter().enumerate() {
                unsafe { v.store(dst.as_mut_ptr().add(c * V::LANES)) };
            }
        }
    }

    /// One reduction step: `acc[r][c] += a[r] * w[c]`.
    ///
    /// `a` holds the `R` batch values of A for this reduction index,
    /// `w` the `WIDTH` output values of W for the same index.
    ///
    /// # Safety
    ///
    /// The CPU must support `V`'s instruction set.
    #[inline(always)]
    pub unsafe fn fma(&mut self, a: &[f32], w: &[f32]) {
        let a = &a[..R];
        let w = &w[..Self::WIDTH];

        let mut wv = [unsafe { V::zero() }; C];
        for (c, v) in wv.iter_mut().enumerate() {
            *v = unsafe { V::load(w.as_ptr().add(c * V::LANES)) };
        }

        for (row, &x) in self.acc.iter_mut().zip(a) {
            let x = unsafe { V::splat(x) };
            for (acc, &m) in row.iter_mut().zip(wv.iter()) {
                *acc = unsafe { m.mul_add(x, *acc) };
            }
        }
    }
}
