//! Matrix storage, layout views and the scalar reference multiply.
//!
//! The reference is the correctness baseline for the tiled kernel; the
//! aligned buffers and random initializer feed the benchmarks and tests.

pub mod aligned;
pub mod init;
pub mod naive;
pub mod view;
