//! # Avatar Info Tick Benchmark
//!
//! TARGETS:
//! - 400 avatars x 400 observers, two client types: well inside one tick
//! - Precompute cost independent of observer count
//!
//! Run with: `cargo bench --package meridian_info`

// Benchmarks don't need strict docs
#![allow(missing_docs)]
#![allow(dead_code)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use meridian_info::{
    AvatarSpawn, DesktopBlockEncoder, ExtendedInfoEncoders, InfoConfig, TickCoordinator,
};
use meridian_shared::{ClientType, CoordGrid, Direction};

/// Builds a crowd of `avatars` and `observers` packed into one area.
fn crowd(avatars: usize, observers: usize, workers: usize) -> (TickCoordinator, Vec<u16>) {
    let mut rng = StdRng::seed_from_u64(42);
    let encoders = ExtendedInfoEncoders::default()
        .with_encoder(ClientType::Android, Arc::new(DesktopBlockEncoder));
    let config = InfoConfig {
        worker_count: workers,
        max_avatars: avatars.max(1),
        max_observers: observers.max(1),
        ..InfoConfig::default()
    };
    let mut coordinator = TickCoordinator::with_encoders(config, encoders).unwrap();

    let mut indices = Vec::with_capacity(avatars);
    for _ in 0..avatars {
        let coord = CoordGrid::new(0, rng.gen_range(3200..3230), rng.gen_range(3200..3230));
        indices.push(
            coordinator
                .avatars_mut()
                .allocate(AvatarSpawn::new(rng.gen_range(0..8000), coord))
                .unwrap(),
        );
    }
    for i in 0..observers {
        let client = if i % 2 == 0 {
            ClientType::Desktop
        } else {
            ClientType::Android
        };
        let coord = CoordGrid::new(0, rng.gen_range(3200..3230), rng.gen_range(3200..3230));
        coordinator.register_observer(client, coord).unwrap();
    }

    // Settle the views.
    coordinator.tick().unwrap();
    (coordinator, indices)
}

/// One tick of movement and animation for a quarter of the crowd.
fn churn(coordinator: &mut TickCoordinator, indices: &[u16], rng: &mut StdRng) {
    for &index in indices.iter().step_by(4) {
        let direction = Direction::from_id(rng.gen_range(0..8));
        let avatars = coordinator.avatars_mut();
        avatars.details_mut(index).unwrap().walk(direction);
        avatars
            .extended_info_mut(index)
            .unwrap()
            .set_sequence(rng.gen_range(0..4000), 0);
    }
}

/// Benchmark: full tick over a dense crowd.
fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tick");
    group.sample_size(20);

    for workers in [1, num_cpus::get()] {
        let (mut coordinator, indices) = crowd(400, 400, workers);
        let mut rng = StdRng::seed_from_u64(7);

        group.bench_with_input(BenchmarkId::new("400x400_workers", workers), &workers, |b, _| {
            b.iter(|| {
                churn(&mut coordinator, &indices, &mut rng);
                let output = coordinator.tick().unwrap();
                for packet in output.packets {
                    coordinator.recycle_packet(black_box(packet.bytes));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark: idle ticks, where only the empty updates are written.
fn bench_idle_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_tick");

    for observers in [10, 100, 400] {
        let (mut coordinator, _) = crowd(200, observers, 1);

        group.bench_with_input(BenchmarkId::from_parameter(observers), &observers, |b, _| {
            b.iter(|| black_box(coordinator.tick().unwrap().report.bytes));
        });
    }
    group.finish();
}

/// Benchmark: precompute cost grows with dirty avatars, not observers.
fn bench_shared_precompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_precompute");
    group.sample_size(20);

    for observers in [50, 400] {
        let (mut coordinator, indices) = crowd(100, observers, 1);

        group.bench_with_input(BenchmarkId::from_parameter(observers), &observers, |b, _| {
            b.iter(|| {
                for &index in &indices {
                    coordinator
                        .avatars_mut()
                        .extended_info_mut(index)
                        .unwrap()
                        .set_name("Bench");
                }
                black_box(coordinator.tick().unwrap().report.precompute_runs)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_tick, bench_idle_tick, bench_shared_precompute);
criterion_main!(benches);
