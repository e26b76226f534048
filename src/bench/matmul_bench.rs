use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tiled_matmul::matrix::init::{Init, random_matrix};
use tiled_matmul::{Dims, Isa, Strategy, TileConfig, TiledMatmul, multiply_reference};

const SIZES: &[(&str, usize)] = &[("n256", 256), ("n512", 512)];

fn tiling(
    isa: Isa,
    b_cache: usize,
    vectors: usize,
    i_cache: usize,
    strategy: Strategy,
) -> TileConfig {
    TileConfig {
        b_cache,
        o_cache: vectors * isa.lanes(),
        i_cache,
        strategy,
        ..TileConfig::for_isa(isa)
    }
}

fn bench_tilings(c: &mut Criterion) {
    let isa = Isa::detect();
    let variants = [
        ("b8_v2_i256_reduction", tiling(isa, 8, 2, 256, Strategy::ReductionBlocked)),
        ("b16_v1_i128_reduction", tiling(isa, 16, 1, 128, Strategy::ReductionBlocked)),
        ("b4_v1_i64_reduction", tiling(isa, 4, 1, 64, Strategy::ReductionBlocked)),
        ("b8_v2_i256_partition", tiling(isa, 8, 2, 256, Strategy::OutputPartition)),
    ];

    for (name, config) in variants {
        let engine = match TiledMatmul::new(config) {
            Ok(engine) => engine,
            Err(e) => {
                println!("Skipping {}: {}", name, e);
                continue;
            }
        };

        let mut group = c.benchmark_group(name);
        for &(label, n) in SIZES {
            let dims = Dims::square(n);
            group.throughput(Throughput::Elements(dims.flops() as u64));

            let a = random_matrix(n * n, Init::SignedUniform, 0xC0FF_EE42 ^ n as u64).unwrap();
            let w = random_matrix(n * n, Init::SignedUniform, 0xBADC_0FFE ^ n as u64).unwrap();
            let mut res = vec![0.0f32; n * n];

            if dims.check(engine.config()).is_err() {
                println!("Skipping {} at {}: tiling doesn't divide", name, label);
                continue;
            }

            group.bench_function(BenchmarkId::new("random", label), |bench| {
                bench.iter(|| {
                    let (a, w) = (black_box(&a[..]), black_box(&w[..]));
                    engine.multiply(a, w, black_box(&mut res[..]), dims).unwrap();
                    black_box(res[n * n - 1]);
                });
            });
        }
        group.finish();
    }
}

fn bench_reference(c: &mut Criterion) {
    let n = 256;
    let dims = Dims::square(n);
    let a = random_matrix(n * n, Init::SignedUniform, 1).unwrap();
    let w = random_matrix(n * n, Init::SignedUniform, 2).unwrap();
    let mut res = vec![0.0f32; n * n];

    let mut group = c.benchmark_group("reference");
    group.throughput(Throughput::Elements(dims.flops() as u64));
    group.sample_size(10);
    group.bench_function(BenchmarkId::new("random", "n256"), |bench| {
        bench.iter(|| {
            multiply_reference(black_box(&a[..]), black_box(&w[..]), black_box(&mut res[..]), dims)
                .unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_tilings, bench_reference);
criterion_main!(benches);
