//! Kernel Generation Benchmarks
//!
//! Measures the cost of synthesizing and packing kernels, and of simulating
//! the production kernel.
//!
//! # Benchmark Categories
//!
//! 1. **Build**: full generation at several batch sizes
//! 2. **Bundling**: greedy packing vs one op per bundle
//! 3. **Simulation**: cycle-level execution of the production kernel

use arbor_kernel::{build_kernel, build_kernel_with, BundleMode, KernelConfig};
use arbor_sim::{build_mem_image, Input, Machine, Tree};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

// =============================================================================
// Build Benchmarks
// =============================================================================

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for batch in [64usize, 128, 256].iter() {
        group.throughput(Throughput::Elements(*batch as u64));
        group.bench_with_input(BenchmarkId::new("height_10", batch), batch, |b, &batch| {
            b.iter(|| build_kernel(black_box(10), 2047, batch, 16).unwrap());
        });
    }

    group.finish();
}

// =============================================================================
// Bundling Benchmarks
// =============================================================================

fn bench_bundling(c: &mut Criterion) {
    let mut group = c.benchmark_group("bundling");

    for mode in [BundleMode::Vliw, BundleMode::Unit] {
        let config = KernelConfig {
            mode,
            ..KernelConfig::default()
        };
        group.bench_function(format!("{:?}", mode), |b| {
            b.iter(|| {
                build_kernel_with(&config, 10, 2047, black_box(256), 16).unwrap()
            });
        });
    }

    group.finish();
}

// =============================================================================
// Simulation Benchmarks
// =============================================================================

fn bench_simulation(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(123);
    let tree = Tree::generate(10, &mut rng).unwrap();
    let input = Input::generate(&tree, 256, 16, &mut rng);
    let mem = build_mem_image(&tree, &input);
    let kernel = build_kernel(10, tree.n_nodes(), 256, 16).unwrap();

    c.bench_function("simulate_production", |b| {
        b.iter(|| {
            let mut machine = Machine::new(
                mem.clone(),
                kernel.program.clone(),
                kernel.debug_info.clone(),
            );
            // Setup pause, then body pause.
            machine.run().unwrap();
            machine.run().unwrap();
            black_box(machine.cycle())
        });
    });
}

criterion_group!(benches, bench_build, bench_bundling, bench_simulation);
criterion_main!(benches);
