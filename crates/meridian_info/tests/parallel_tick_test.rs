//! Integration test for parallel ticks and file configuration.

mod common;

use std::sync::Arc;

use common::decode;
use meridian_info::{
    AvatarSpawn, DesktopBlockEncoder, ExtendedInfoEncoders, InfoConfig, InfoError, ObserverId,
    ObserverPacket, TickCoordinator,
};
use meridian_shared::{ClientType, CoordGrid, Direction};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TICKS: usize = 6;

fn random_direction(rng: &mut StdRng) -> Direction {
    Direction::from_id(rng.gen_range(0..8))
}

/// Runs a seeded crowd simulation and returns every packet of every tick.
fn simulate(workers: usize) -> Vec<Vec<ObserverPacket>> {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let encoders = ExtendedInfoEncoders::default()
        .with_encoder(ClientType::Android, Arc::new(DesktopBlockEncoder));
    let config = InfoConfig {
        worker_count: workers,
        chunk_size: 4,
        max_avatars: 256,
        max_observers: 64,
        ..InfoConfig::default()
    };
    let mut coordinator = TickCoordinator::with_encoders(config, encoders).unwrap();

    let mut avatars = Vec::new();
    for _ in 0..120 {
        let coord = CoordGrid::new(0, rng.gen_range(100..140), rng.gen_range(100..140));
        let spawn = AvatarSpawn::new(rng.gen_range(0..5000), coord).with_spawn_cycle(rng.gen_range(0..3));
        avatars.push(coordinator.avatars_mut().allocate(spawn).unwrap());
    }

    let mut observers: Vec<ObserverId> = Vec::new();
    for i in 0..40 {
        let client = if i % 3 == 0 {
            ClientType::Android
        } else {
            ClientType::Desktop
        };
        let coord = CoordGrid::new(0, rng.gen_range(100..140), rng.gen_range(100..140));
        observers.push(coordinator.register_observer(client, coord).unwrap());
    }

    let mut ticks = Vec::new();
    for _ in 0..TICKS {
        for &index in &avatars {
            let repository = coordinator.avatars_mut();
            match rng.gen_range(0..10) {
                0 => repository.details_mut(index).unwrap().walk(random_direction(&mut rng)),
                1 => {
                    let details = repository.details_mut(index).unwrap();
                    details.walk(random_direction(&mut rng));
                    details.walk(random_direction(&mut rng));
                }
                2 => repository.details_mut(index).unwrap().crawl(random_direction(&mut rng)),
                3 => {
                    let details = repository.details_mut(index).unwrap();
                    let coord = details.coord();
                    details.teleport_to(0, coord.x() + rng.gen_range(0..3), coord.z(), false);
                }
                4 => repository
                    .extended_info_mut(index)
                    .unwrap()
                    .set_sequence(rng.gen_range(0..2000), rng.gen_range(0..4)),
                5 => repository
                    .extended_info_mut(index)
                    .unwrap()
                    .set_move_speed(rng.gen_range(0..3)),
                6 => repository
                    .extended_info_mut(index)
                    .unwrap()
                    .set_name(format!("avatar{index}")),
                _ => {}
            }
        }

        let previous: Vec<Vec<u16>> = observers
            .iter()
            .map(|id| coordinator.observer(*id).unwrap().tracked().to_vec())
            .collect();

        let output = coordinator.tick().unwrap();
        assert_eq!(output.report.failed_observers, 0);
        assert_eq!(output.report.cache_misses, 0);
        assert_eq!(output.packets.len(), observers.len());

        for (packet, tracked) in output.packets.iter().zip(&previous) {
            let decoded = decode(&packet.bytes, tracked, false);
            let now = coordinator.observer(packet.observer).unwrap().tracked();
            for addition in &decoded.additions {
                assert!(now.contains(&addition.index));
            }
        }
        ticks.push(output.packets);
    }
    ticks
}

#[test]
fn test_parallel_tick_matches_serial() {
    let serial = simulate(1);
    let parallel = simulate(4);
    assert_eq!(serial.len(), TICKS);
    assert_eq!(serial, parallel);
}

#[test]
fn test_load_config_file() {
    let path = std::env::temp_dir().join(format!("meridian_info_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "worker_count = 3\nchunk_size = 8\nhigh_detail_radius = 2\nmax_extended_info_bytes = 512\n",
    )
    .unwrap();

    let config = InfoConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.worker_count, 3);
    assert_eq!(config.chunk_size, 8);
    assert_eq!(config.high_detail_radius, 2);
    assert_eq!(config.max_extended_info_bytes, 512);
    assert_eq!(config.max_tracked, InfoConfig::default().max_tracked);

    let coordinator = TickCoordinator::new(config).unwrap();
    assert_eq!(coordinator.config().chunk_size, 8);
}

#[test]
fn test_invalid_config_rejected_by_coordinator() {
    let result = TickCoordinator::new(InfoConfig {
        worker_count: 0,
        ..InfoConfig::default()
    });
    assert!(matches!(result, Err(InfoError::InvalidConfig(_))));
}
