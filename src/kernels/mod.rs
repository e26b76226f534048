//! SIMD building blocks for the inner loop.
//!
//! - `lanes`: one vector register of f32 (AVX2, AVX-512, portable)
//! - `tile`: a block of register-resident accumulators with
//!   zero / load / store / fma

pub mod lanes;
pub mod tile;
