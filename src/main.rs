//! Benchmark runner for the tiled matmul.

use std::time::Instant;

use tiled_matmul::accuracy::compare;
use tiled_matmul::matrix::init::{Init, random_matrix};
use tiled_matmul::{
    AlignedBuf, Dims, Isa, MatmulError, Strategy, TOLERANCE, TileConfig, TiledMatmul, gflops,
    multiply_reference,
};

const SIZES: [usize; 2] = [256, 512];
const TRIALS: usize = 5;
const MULTIPLIES_PER_TRIAL: usize = 20;

fn main() -> Result<(), MatmulError> {
    println!("=== Tiled Matrix Multiplication Benchmark ===\n");

    let isa = Isa::detect();
    println!(
        "ISA: {} ({} lanes, {} vector registers)\n",
        isa,
        isa.lanes(),
        isa.registers()
    );

    for &n in &SIZES {
        let dims = Dims::square(n);
        println!("B = I = O = {}", n);
        println!("{}", "-".repeat(60));

        let start = Instant::now();
        let a = random_matrix(n * n, Init::SignedUniform, 0x5eed_0001)?;
        let w = random_matrix(n * n, Init::SignedUniform, 0x5eed_0002)?;
        println!("Total time alloc: {:.6} s", start.elapsed().as_secs_f64());

        let mut expected = AlignedBuf::zeroed(n * n)?;
        multiply_reference(&a, &w, &mut expected, dims)?;

        for config in candidate_configs(isa) {
            let label = format!(
                "{} b{} o{} i{} {}t",
                config.strategy, config.b_cache, config.o_cache, config.i_cache, config.threads
            );
            match bench_config(config, &a, &w, &expected, dims) {
                Ok(avg) => {
                    println!("{:40} avg {:9.6} s  {:8.2} GFLOPS", label, avg, gflops(dims, avg))
                }
                Err(e) => println!("{:40} skipped: {}", label, e),
            }
        }
        println!();
    }

    Ok(())
}

/// Tilings worth comparing on `isa`: wide vs tall accumulator tiles, both
/// schedules.
fn candidate_configs(isa: Isa) -> Vec<TileConfig> {
    let lanes = isa.lanes();
    let base = TileConfig::for_isa(isa);
    vec![
        TileConfig {
            b_cache: 8,
            o_cache: 2 * lanes,
            i_cache: 256,
            strategy: Strategy::ReductionBlocked,
            ..base
        },
        TileConfig {
            b_cache: 16,
            o_cache: lanes,
            i_cache: 128,
            strategy: Strategy::ReductionBlocked,
            ..base
        },
        TileConfig {
            b_cache: 8,
            o_cache: 2 * lanes,
            i_cache: 256,
            strategy: Strategy::OutputPartition,
            ..base
        },
        TileConfig {
            b_cache: 4,
            o_cache: lanes,
            i_cache: 64,
            strategy: Strategy::ReductionBlocked,
            ..base
        },
    ]
}

/// Runs `TRIALS` timed batches and returns the average seconds per multiply.
fn bench_config(
    config: TileConfig,
    a: &[f32],
    w: &[f32],
    expected: &[f32],
    dims: Dims,
) -> Result<f64, MatmulError> {
    let engine = TiledMatmul::new(config)?;
    let mut res = AlignedBuf::zeroed(dims.batch * dims.output)?;

    // Warmup, and the result we check
    engine.multiply(a, w, &mut res, dims)?;
    let report = compare(expected, &res, TOLERANCE);
    if report.all_matched() {
        println!("  {}", report);
    } else {
        println!("  MISMATCH {}", report);
    }

    let mut total = 0.0;
    for trial in 0..TRIALS {
        let start = Instant::now();
        for _ in 0..MULTIPLIES_PER_TRIAL {
            engine.multiply(a, w, &mut res, dims)?;
        }
        let per_multiply = start.elapsed().as_secs_f64() / MULTIPLIES_PER_TRIAL as f64;
        println!(
            "  Trial: {}, Time: {:.6} GFLOPS: {:.2}",
            trial + 1,
            per_multiply,
            gflops(dims, per_multiply)
        );
        total += per_multiply;
    }

    Ok(total / TRIALS as f64)
}
