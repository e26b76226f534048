//! Cache-blocked core kernel.
//!
//! One call computes the product for the output columns a worker owns,
//! walking reduction blocks, output blocks and batch blocks so the W rows
//! and A columns a tile needs stay hot in L1/L2 while the accumulators sit
//! in vector registers.
//!
//! The kernel is instantiated per instruction set (AVX2, AVX-512, portable)
//! and per accumulator tile shape; `core_kernel::select_kernel` picks one at
//! configuration time.

pub mod core_kernel;
