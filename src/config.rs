//! Tiling configuration and problem dimensions.
//!
//! Everything here is validated before a multiply touches any buffer. A
//! configuration that passes [`TileConfig::validate`] and dimensions that
//! pass [`Dims::check`] are all the kernel needs to stay in bounds.

use std::fmt;

use crate::blocked::core_kernel::select_kernel;
use crate::error::{MatmulError, Result};

/// Vector instruction set the kernel is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isa {
    /// 256-bit AVX2 + FMA: 8 lanes, 16 YMM registers.
    Avx2,
    /// 512-bit AVX-512F: 16 lanes, 32 ZMM registers.
    Avx512,
    /// Plain Rust lane arrays, runs everywhere. Sized like AVX2.
    Portable,
}

impl Isa {
    /// Best instruction set the running CPU supports (AVX-512 > AVX2 > portable).
    pub fn detect() -> Isa {
        if Isa::Avx512.is_available() {
            Isa::Avx512
        } else if Isa::Avx2.is_available() {
            Isa::Avx2
        } else {
            Isa::Portable
        }
    }

    pub fn is_available(self) -> bool {
        match self {
            Isa::Portable => true,
            #[cfg(target_arch = "x86_64")]
            Isa::Avx2 => is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"),
            #[cfg(target_arch = "x86_64")]
            Isa::Avx512 => is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("fma"),
            #[cfg(not(target_arch = "x86_64"))]
            Isa::Avx2 | Isa::Avx512 => false,
        }
    }

    /// f32 values per vector.
    pub fn lanes(self) -> usize {
        match self {
            Isa::Avx2 | Isa::Portable => 8,
            Isa::Avx512 => 16,
        }
    }

    /// Architectural vector registers available for accumulators.
    pub fn registers(self) -> usize {
        match self {
            Isa::Avx2 | Isa::Portable => 16,
            Isa::Avx512 => 32,
        }
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Isa::Avx2 => "AVX2",
            Isa::Avx512 => "AVX-512",
            Isa::Portable => "portable",
        };
        f.write_str(name)
    }
}

/// How work is split across the worker team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Each worker owns `O / threads` output columns and runs the whole
    /// reduction over them.
    OutputPartition,
    /// Sequential loop over `i_cache` reduction blocks; inside each block the
    /// `O / o_cache` output blocks run in parallel.
    #[default]
    ReductionBlocked,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::OutputPartition => f.write_str("output-partition"),
            Strategy::ReductionBlocked => f.write_str("reduction-blocked"),
        }
    }
}

/// Problem size for `Res[B,O] = A^T[B,I] · W[I,O]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    /// B: rows of the output, columns of A's storage.
    pub batch: usize,
    /// I: the reduction dimension.
    pub input: usize,
    /// O: columns of W and of the output.
    pub output: usize,
}

impl Dims {
    pub const fn new(batch: usize, input: usize, output: usize) -> Self {
        Dims {
            batch,
            input,
            output,
        }
    }

    pub const fn square(n: usize) -> Self {
        Dims::new(n, n, n)
    }

    /// Floating-point operations in one product (`2*B*I*O`).
    pub fn flops(&self) -> f64 {
        2.0 * self.batch as f64 * self.input as f64 * self.output as f64
    }

    /// Checks the tiling divisibility rules for this problem size.
    pub fn check(&self, config: &TileConfig) -> Result<()> {
        for (name, value) in [("B", self.batch), ("I", self.input), ("O", self.output)] {
            if value == 0 {
                return Err(MatmulError::ZeroParameter(name));
            }
        }

        divides("B", self.batch, "b_cache", config.b_cache)?;
        divides("O", self.output, "o_cache", config.o_cache)?;
        divides("I", self.input, "i_cache", config.i_cache)?;

        if config.strategy == Strategy::OutputPartition {
            divides("O", self.output, "threads", config.threads)?;
            divides("O / threads", self.output / config.threads, "o_cache", config.o_cache)?;
        }
        Ok(())
    }
}

fn divides(dim: &'static str, size: usize, by: &'static str, divisor: usize) -> Result<()> {
    if divisor == 0 {
        return Err(MatmulError::ZeroParameter(by));
    }
    if size % divisor != 0 {
        return Err(MatmulError::NotDivisible {
            dim,
            size,
            by,
            divisor,
        });
    }
    Ok(())
}

/// Tile sizes, worker count and instruction set for one multiply engine.
///
/// The accumulator tile is `b_cache` rows by `o_cache / lanes` vectors and
/// must fit the register file, otherwise the compiler spills it to the stack
/// and the blocking buys nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    pub isa: Isa,
    /// Rows of A broadcast per tile.
    pub b_cache: usize,
    /// Output columns per tile, a multiple of the lane width.
    pub o_cache: usize,
    /// Reduction indices per block.
    pub i_cache: usize,
    /// Size of the worker team.
    pub threads: usize,
    pub strategy: Strategy,
}

impl Default for TileConfig {
    fn default() -> Self {
        TileConfig::for_isa(Isa::detect())
    }
}

impl TileConfig {
    /// Defaults tuned on an 8-core AVX-512 box: a wide output tile beats a
    /// tall batch tile.
    pub fn for_isa(isa: Isa) -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        TileConfig {
            isa,
            b_cache: 8,
            o_cache: 16,
            i_cache: 256,
            threads,
            strategy: Strategy::default(),
        }
    }

    /// Vectors per accumulator row.
    pub fn vectors(&self) -> usize {
        self.o_cache / self.isa.lanes()
    }

    /// Vector registers the accumulator tile occupies.
    pub fn tile_registers(&self) -> usize {
        self.b_cache * self.vectors()
    }

    /// Checks every dimension-independent invariant.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("b_cache", self.b_cache),
            ("o_cache", self.o_cache),
            ("i_cache", self.i_cache),
            ("threads", self.threads),
        ] {
            if value == 0 {
                return Err(MatmulError::ZeroParameter(name));
            }
        }

        let lanes = self.isa.lanes();
        if self.o_cache % lanes != 0 {
            return Err(MatmulError::LaneMismatch {
                o_cache: self.o_cache,
                isa: self.isa,
                lanes,
            });
        }

        let needed = self.tile_registers();
        if needed > self.isa.registers() {
            return Err(MatmulError::RegisterPressure {
                needed,
                available: self.isa.registers(),
                isa: self.isa,
            });
        }

        if !self.isa.is_available() {
            return Err(MatmulError::IsaUnavailable(self.isa));
        }

        if select_kernel(self.isa, self.b_cache, self.vectors()).is_none() {
            return Err(MatmulError::UnsupportedTile {
                b_cache: self.b_cache,
                vectors: self.vectors(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portable(b_cache: usize, o_cache: usize) -> TileConfig {
        TileConfig {
            isa: Isa::Portable,
            b_cache,
            o_cache,
            i_cache: 64,
            threads: 4,
            strategy: Strategy::ReductionBlocked,
        }
    }

    #[test]
    fn test_valid_portable_config() {
        assert!(portable(16, 8).validate().is_ok());
        assert!(portable(4, 32).validate().is_ok());
    }

    #[test]
    fn test_zero_parameter_rejected() {
        let mut cfg = portable(8, 8);
        cfg.i_cache = 0;
        assert!(matches!(cfg.validate(), Err(MatmulError::ZeroParameter("i_cache"))));
    }

    #[test]
    fn test_lane_width_rejected() {
        let cfg = portable(8, 12);
        assert!(matches!(
            cfg.validate(),
            Err(MatmulError::LaneMismatch { lanes: 8, .. })
        ));
    }

    #[test]
    fn test_register_pressure_rejected() {
        // 16 rows x 2 vectors = 32 accumulators, twice the AVX2-sized file
        let cfg = portable(16, 16);
        assert!(matches!(
            cfg.validate(),
            Err(MatmulError::RegisterPressure {
                needed: 32,
                available: 16,
                ..
            })
        ));
    }

    #[test]
    fn test_unsupported_tile_rejected() {
        let cfg = portable(3, 8);
        assert!(matches!(
            cfg.validate(),
            Err(MatmulError::UnsupportedTile { b_cache: 3, vectors: 1 })
        ));
    }

    #[test]
    fn test_dims_divisibility() {
        let cfg = portable(16, 8);
        assert!(Dims::square(256).check(&cfg).is_ok());
        assert!(matches!(
            Dims::new(24, 64, 64).check(&cfg),
            Err(MatmulError::NotDivisible { dim: "B", .. })
        ));
        assert!(matches!(
            Dims::new(32, 96, 64).check(&cfg),
            Err(MatmulError::NotDivisible { dim: "I", .. })
        ));
    }

    #[test]
    fn test_output_partition_needs_even_slices() {
        let mut cfg = portable(8, 8);
        cfg.strategy = Strategy::OutputPartition;
        cfg.threads = 8;
        // 64 / 8 = 8 columns per worker: one o_cache block each
        assert!(Dims::square(64).check(&cfg).is_ok());
        // 32 / 8 = 4 columns per worker, narrower than one tile
        assert!(matches!(
            Dims::new(32, 64, 32).check(&cfg),
            Err(MatmulError::NotDivisible { dim: "O / threads", .. })
        ));
    }

    #[test]
    fn test_dims_check_with_unvalidated_config() {
        let mut cfg = portable(0, 8);
        assert!(matches!(
            Dims::square(8).check(&cfg),
            Err(MatmulError::ZeroParameter("b_cache"))
        ));

        cfg = portable(8, 8);
        cfg.strategy = Strategy::OutputPartition;
        cfg.threads = 0;
        assert!(matches!(
            Dims::new(8, 64, 8).check(&cfg),
            Err(MatmulError::ZeroParameter("threads"))
        ));
    }

    #[test]
    fn test_flops() {
        assert_eq!(Dims::new(2, 3, 4).flops(), 48.0);
    }
}
