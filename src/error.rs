use thiserror::Error;

use crate::config::Isa;

#[derive(Error, Debug)]
pub enum MatmulError {
    #[error("`{0}` must be non-zero")]
    ZeroParameter(&'static str),
    #[error("{dim} = {size} is not divisible by {by} = {divisor}")]
    NotDivisible {
        dim: &'static str,
        size: usize,
        by: &'static str,
        divisor: usize,
    },
    #[error("o_cache = {o_cache} is not a multiple of the {isa} lane width {lanes}")]
    LaneMismatch { o_cache: usize, isa: Isa, lanes: usize },
    #[error("accumulator tile needs {needed} vector registers, {isa} only has {available}")]
    RegisterPressure {
        needed: usize,
        available: usize,
        isa: Isa,
    },
    #[error("no kernel compiled for a {b_cache}x{vectors} accumulator tile")]
    UnsupportedTile { b_cache: usize, vectors: usize },
    #[error("{0} is not supported by this CPU")]
    IsaUnavailable(Isa),
    #[error("{name}: expected {expected} elements, got {got}")]
    ShapeMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{name}: {rows} x {cols} elements overflows the address space")]
    Overflow {
        name: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("failed to allocate {bytes} aligned bytes")]
    Alloc { bytes: usize },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, MatmulError>;
