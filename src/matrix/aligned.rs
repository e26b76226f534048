//! 64-byte aligned `f32` buffers for A, W and Res.

use std::alloc::{self, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::error::{MatmulError, Result};

/// Cache-line alignment; also satisfies aligned 256- and 512-bit loads.
pub const ALIGNMENT: usize = 64;

/// Heap buffer of `f32` aligned to [`ALIGNMENT`], zeroed on allocation.
pub struct AlignedBuf {
    ptr: NonNull<f32>,
    len: usize,
    /// Kept so `Drop` deallocates with exactly the layout it allocated with.
    layout: Layout,
}

// SAFETY: the buffer is uniquely owned, like a `Vec<f32>`.
unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

impl AlignedBuf {
    /// Allocates `len` zeroed floats. Fails instead of aborting when the
    /// allocator refuses.
    pub fn zeroed(len: usize) -> Result<Self> {
        let bytes = len
            .checked_mul(mem::size_of::<f32>())
            .ok_or(MatmulError::Alloc { bytes: usize::MAX })?;
        let layout =
            Layout::from_size_align(bytes, ALIGNMENT).map_err(|_| MatmulError::Alloc { bytes })?;

        if layout.size() == 0 {
            return Ok(AlignedBuf {
                ptr: NonNull::dangling(),
                len: 0,
                layout,
            });
        }

        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<f32>()).ok_or(MatmulError::Alloc { bytes })?;
        Ok(AlignedBuf { ptr, len, layout })
    }

    /// Aligned copy of `src`.
    pub fn from_slice(src: &[f32]) -> Result<Self> {
        let mut buf = AlignedBuf::zeroed(src.len())?;
        buf.copy_from_slice(src);
        Ok(buf)
    }
}

impl Deref for AlignedBuf {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        // SAFETY: `ptr` is valid for `len` initialized floats (or dangling with len 0).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut [f32] {
        // SAFETY: as above, and `&mut self` guarantees uniqueness.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        if self.layout.size() > 0 {
            // SAFETY: allocated in `zeroed` with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) };
        }
    }
}

impl fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuf").field("len", &self.len).finish()
    }
}
