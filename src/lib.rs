//! Tiled, multi-core f32 matrix multiply: `Res[B,O] = A^T[B,I] · W[I,O]`.
//!
//! A (activations) is stored column-major, W (weights) and Res row-major.
//! Speed comes from three things stacked on top of each other: splitting
//! output columns across cores, blocking each core's work so the W rows and
//! A columns it touches stay in cache, and keeping a small tile of
//! accumulators in vector registers while FMAs stream through them.
//!
//! ## Usage
//!
//! ```
//! use tiled_matmul::{Dims, Isa, TileConfig, multiply};
//!
//! let dims = Dims::square(64);
//! let a = vec![1.0f32; 64 * 64];
//! let w = vec![1.0f32; 64 * 64];
//! let mut res = vec![0.0f32; 64 * 64];
//!
//! let config = TileConfig {
//!     b_cache: 8,
//!     o_cache: 8,
//!     i_cache: 32,
//!     threads: 2,
//!     ..TileConfig::for_isa(Isa::Portable)
//! };
//! multiply(&a, &w, &mut res, dims, &config)?;
//! assert!(res.iter().all(|&x| x == 64.0));
//! # Ok::<(), tiled_matmul::MatmulError>(())
//! ```
//!
//! For repeated products build a [`TiledMatmul`] once; it validates the
//! configuration and owns the worker pool:
//!
//! ```
//! use tiled_matmul::{Dims, TileConfig, TiledMatmul, multiply_reference};
//!
//! let dims = Dims::new(32, 256, 64);
//! let a: Vec<f32> = (0..32 * 256).map(|i| (i % 7) as f32).collect();
//! let w: Vec<f32> = (0..256 * 64).map(|i| (i % 5) as f32).collect();
//!
//! let engine = TiledMatmul::new(TileConfig { threads: 4, ..TileConfig::default() })?;
//! let mut res = vec![0.0f32; 32 * 64];
//! engine.multiply(&a, &w, &mut res, dims)?;
//!
//! let mut expected = vec![0.0f32; 32 * 64];
//! multiply_reference(&a, &w, &mut expected, dims)?;
//! assert_eq!(res, expected);
//! # Ok::<(), tiled_matmul::MatmulError>(())
//! ```
//!
//! ## What's inside
//!
//! - AVX2 (8 lanes), AVX-512 (16 lanes) and portable kernels, picked at
//!   runtime
//! - Accumulator tiles from 1×1 up to 32 vectors, checked against the
//!   register file
//! - Two schedules: per-core output slices, or reduction blocks with
//!   parallel output tiles

pub mod accuracy;
pub mod blocked;
pub mod config;
pub mod error;
pub mod kernels;
pub mod matrix;
pub mod threaded;

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use accuracy::{AccuracyReport, TOLERANCE};
pub use config::{Dims, Isa, Strategy, TileConfig};
pub use error::{MatmulError, Result};
pub use matrix::aligned::AlignedBuf;

use blocked::core_kernel::{CoreFn, select_kernel};
use matrix::naive::matmul_reference;
use matrix::view::{ColMajor, RowMajor, RowMajorMut, check_len};

/// Checks dimensions and buffer lengths, then wraps the buffers in views.
fn views<'a>(
    a: &'a [f32],
    w: &'a [f32],
    res: &'a mut [f32],
    dims: Dims,
) -> Result<(ColMajor<'a>, RowMajor<'a>, RowMajorMut<'a>)> {
    let Dims {
        batch,
        input,
        output,
    } = dims;
    check_len("A", a.len(), batch, input)?;
    check_len("W", w.len(), input, output)?;
    check_len("Res", res.len(), batch, output)?;

    Ok((
        ColMajor::new(a, batch, input)?,
        RowMajor::new(w, input, output)?,
        RowMajorMut::new(res, batch, output)?,
    ))
}

/// A validated tiling configuration with its kernel and worker pool.
#[derive(Debug)]
pub struct TiledMatmul {
    config: TileConfig,
    kernel: CoreFn,
    pool: ThreadPool,
}

impl TiledMatmul {
    /// Validates `config`, selects the kernel for its tile shape and
    /// instruction set, and starts `config.threads` workers.
    pub fn new(config: TileConfig) -> Result<Self> {
        config.validate()?;
        let kernel = select_kernel(config.isa, config.b_cache, config.vectors()).ok_or(
            MatmulError::UnsupportedTile {
                b_cache: config.b_cache,
                vectors: config.vectors(),
            },
        )?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("matmul-{}", i))
            .build()?;

        debug!(
            "matmul engine: {} {}x{} tile ({} registers), i_cache={}, {} threads, {}",
            config.isa,
            config.b_cache,
            config.o_cache,
            config.tile_registers(),
            config.i_cache,
            config.threads,
            config.strategy
        );

        Ok(TiledMatmul {
            config,
            kernel,
            pool,
        })
    }

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    /// `res = A^T · W`.
    ///
    /// Every precondition is checked before any buffer is touched; on error
    /// `res` is left exactly as it was. On success every element of `res` has
    /// been overwritten, whatever it held before.
    ///
    /// # Arguments
    ///
    /// * `a` - Matrix A (B × I), column-major
    /// * `w` - Matrix W (I × O), row-major
    /// * `res` - Matrix Res (B × O), row-major
    pub fn multiply(&self, a: &[f32], w: &[f32], res: &mut [f32], dims: Dims) -> Result<()> {
        dims.check(&self.config)?;
        let (a, w, mut res) = views(a, w, res, dims)?;

        debug!(
            "multiply B={} I={} O={} ({})",
            dims.batch, dims.input, dims.output, self.config.strategy
        );

        // SAFETY: the kernel was selected for a validated config and the
        // dimensions passed `Dims::check`.
        unsafe {
            threaded::dispatch::dispatch(&self.pool, self.kernel, &self.config, a, w, &mut res);
        }
        Ok(())
    }
}

/// One-shot [`TiledMatmul::multiply`]. Builds a worker pool per call; prefer
/// the engine when multiplying more than once.
pub fn multiply(
    a: &[f32],
    w: &[f32],
    res: &mut [f32],
    dims: Dims,
    config: &TileConfig,
) -> Result<()> {
    TiledMatmul::new(*config)?.multiply(a, w, res, dims)
}

/// Scalar reference product with the same layouts, for checking results.
pub fn multiply_reference(a: &[f32], w: &[f32], res: &mut [f32], dims: Dims) -> Result<()> {
    let (a, w, mut res) = views(a, w, res, dims)?;
    matmul_reference(a, w, &mut res);
    Ok(())
}

/// Throughput of one product that took `seconds`.
pub fn gflops(dims: Dims, seconds: f64) -> f64 {
    dims.flops() / seconds / 1e9
}
