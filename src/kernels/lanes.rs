//! One vector register's worth of `f32` lanes.
//!
//! The tile and core kernel are written once against [`F32Lanes`] and
//! monomorphized per instruction set. Every method is `#[inline(always)]`
//! so that, once inlined into a `#[target_feature]` function, the intrinsics
//! compile to single instructions on register operands.

/// A SIMD vector of `LANES` floats.
///
/// # Safety
///
/// Methods of the x86 implementations execute AVX2/AVX-512 instructions;
/// callers must have checked the CPU supports them. Pointer arguments must
/// be valid for `LANES` floats. No alignment is required.
pub trait F32Lanes: Copy {
    const LANES: usize;

    unsafe fn zero() -> Self;

    unsafe fn load(src: *const f32) -> Self;

    unsafe fn store(self, dst: *mut f32);

    /// All lanes set to `x`.
    unsafe fn splat(x: f32) -> Self;

    /// `self * b + acc`.
    unsafe fn mul_add(self, b: Self, acc: Self) -> Self;
}

/// Eight lanes in a plain array. Runs on any target; rounds the product
/// and the sum separately, exactly like a scalar `acc += a * b`.
#[derive(Debug, Clone, Copy)]
pub struct Portable([f32; 8]);

impl F32Lanes for Portable {
    const LANES: usize = 8;

    #[inline(always)]
    unsafe fn zero() -> Self {
        Portable([0.0; 8])
    }

    #[inline(always)]
    unsafe fn load(src: *const f32) -> Self {
        let mut v = [0.0; 8];
        unsafe { std::ptr::copy_nonoverlapping(src, v.as_mut_ptr(), 8) };
        Portable(v)
    }

    #[inline(always)]
    unsafe fn store(self, dst: *mut f32) {
        unsafe { std::ptr::copy_nonoverlapping(self.0.as_ptr(), dst, 8) };
    }

    #[inline(always)]
    unsafe fn splat(x: f32) -> Self {
        Portable([x; 8])
    }

    #[inline(always)]
    unsafe fn mul_add(self, b: Self, acc: Self) -> Self {
        let mut out = acc.0;
        for (o, (x, y)) in out.iter_mut().zip(self.0.iter().zip(b.0.iter())) {
            *o += x * y;
        }
        Portable(out)
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86::{Avx2, Avx512};

#[cfg(target_arch = "x86_64")]
#[allow(unsafe_op_in_unsafe_fn)]
mod x86 {
    use std::arch::x86_64::*;

    use super::F32Lanes;

    /// 256-bit YMM register, 8 lanes.
    #[derive(Debug, Clone, Copy)]
    pub struct Avx2(__m256);

    impl F32Lanes for Avx2 {
        const LANES: usize = 8;

        #[inline(always)]
        unsafe fn zero() -> Self {
            Avx2(_mm256_setzero_ps())
        }

        #[inline(always)]
        unsafe fn load(src: *const f32) -> Self {
            Avx2(_mm256_loadu_ps(src))
        }

        #[inline(always)]
        unsafe fn store(self, dst: *mut f32) {
            _mm256_storeu_ps(dst, self.0)
        }

        #[inline(always)]
        unsafe fn splat(x: f32) -> Self {
            Avx2(_mm256_set1_ps(x))
        }

        #[inline(always)]
        unsafe fn mul_add(self, b: Self, acc: Self) -> Self {
            Avx2(_mm256_fmadd_ps(self.0, b.0, acc.0))
        }
    }

    /// 512-bit ZMM register, 16 lanes.
    #[derive(Debug, Clone, Copy)]
    pub struct Avx512(__m512);

    impl F32Lanes for Avx512 {
        const LANES: usize = 16;

        #[inline(always)]
        unsafe fn zero() -> Self {
            Avx512(_mm512_setzero_ps())
        }

        #[inline(always)]
        unsafe fn load(src: *const f32) -> Self {
            Avx512(_mm512_loadu_ps(src))
        }

        #[inline(always)]
        unsafe fn store(self, dst: *mut f32) {
            _mm512_storeu_ps(dst, self.0)
        }

        #[inline(always)]
        unsafe fn splat(x: f32) -> Self {
            Avx512(_mm512_set1_ps(x))
        }

        #[inline(always)]
        unsafe fn mul_add(self, b: Self, acc: Self) -> Self {
            Avx512(_mm512_fmadd_ps(self.0, b.0, acc.0))
        }
    }
}
