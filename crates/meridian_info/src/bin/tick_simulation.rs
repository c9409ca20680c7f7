//! # Tick Simulation
//!
//! Drives the avatar info pipeline with a seeded crowd and prints packet
//! and timing statistics.
//!
//! ## Usage
//!
//! ```bash
//! tick_simulation --avatars 2000 --observers 500 --ticks 100 --config meridian.toml
//! ```

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use meridian_info::{
    AvatarSpawn, DesktopBlockEncoder, ExtendedInfoEncoders, InfoConfig, InfoResult,
    TickCoordinator, TickReport,
};
use meridian_shared::{ClientType, CoordGrid, Direction};

/// Side of the square the crowd wanders in.
const AREA: u32 = 64;
const ORIGIN_X: u32 = 3200;
const ORIGIN_Z: u32 = 3200;

struct Options {
    avatars: usize,
    observers: usize,
    ticks: usize,
    seed: u64,
    config: Option<String>,
}

#[derive(Default)]
struct Totals {
    bytes: usize,
    additions: usize,
    removals: usize,
    deferred: usize,
    violations: usize,
    precompute_runs: u64,
    recycled: usize,
}

impl Totals {
    fn add(&mut self, report: &TickReport) {
        self.bytes += report.bytes;
        self.additions += report.additions;
        self.removals += report.removals;
        self.deferred += report.deferred;
        self.violations += report.violations;
        self.precompute_runs += report.precompute_runs;
        self.recycled += report.recycled_indices;
    }
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_names(true))
        .init();

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         MERIDIAN - AVATAR INFO TICK SIMULATION                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let Some(options) = parse_args() else {
        return;
    };

    if let Err(error) = run(&options) {
        tracing::error!("Simulation failed: {}", error);
        std::process::exit(1);
    }
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        avatars: 2_000,
        observers: 500,
        ticks: 100,
        seed: 228,
        config: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--avatars" | "-a" => {
                options.avatars = value.and_then(|v| v.parse().ok()).unwrap_or(options.avatars);
                i += 1;
            }
            "--observers" | "-o" => {
                options.observers = value.and_then(|v| v.parse().ok()).unwrap_or(options.observers);
                i += 1;
            }
            "--ticks" | "-t" => {
                options.ticks = value.and_then(|v| v.parse().ok()).unwrap_or(options.ticks);
                i += 1;
            }
            "--seed" | "-s" => {
                options.seed = value.and_then(|v| v.parse().ok()).unwrap_or(options.seed);
                i += 1;
            }
            "--config" | "-c" => {
                options.config = value.cloned();
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: tick_simulation [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -a, --avatars <NUM>      Avatars in the crowd (default: 2000)");
                println!("  -o, --observers <NUM>    Observers watching (default: 500)");
                println!("  -t, --ticks <NUM>        Ticks to simulate (default: 100)");
                println!("  -s, --seed <NUM>         Crowd seed (default: 228)");
                println!("  -c, --config <PATH>      TOML configuration file");
                println!("  -h, --help               Show this help");
                return None;
            }
            _ => {}
        }
        i += 1;
    }
    Some(options)
}

fn random_coord(rng: &mut StdRng) -> CoordGrid {
    CoordGrid::new(
        0,
        ORIGIN_X + rng.gen_range(0..AREA),
        ORIGIN_Z + rng.gen_range(0..AREA),
    )
}

fn run(options: &Options) -> InfoResult<()> {
    let config = match &options.config {
        Some(path) => InfoConfig::load(path)?,
        None => InfoConfig {
            max_avatars: options.avatars.max(1) * 2,
            max_observers: options.observers.max(1),
            ..InfoConfig::default()
        },
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Avatars:            {}", options.avatars);
    println!("│ Observers:          {}", options.observers);
    println!("│ Ticks:              {}", options.ticks);
    println!("│ Workers:            {}", config.worker_count);
    println!("│ Max Tracked:        {}", config.max_tracked);
    println!("│ High Detail Radius: {}", config.high_detail_radius);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let encoders = ExtendedInfoEncoders::default()
        .with_encoder(ClientType::Android, Arc::new(DesktopBlockEncoder))
        .with_encoder(ClientType::Ios, Arc::new(DesktopBlockEncoder));
    let mut coordinator = TickCoordinator::with_encoders(config, encoders)?;
    let mut rng = StdRng::seed_from_u64(options.seed);

    let mut avatars = Vec::with_capacity(options.avatars);
    for _ in 0..options.avatars {
        let spawn = AvatarSpawn::new(rng.gen_range(0..16_000), random_coord(&mut rng))
            .with_direction(Direction::from_id(rng.gen_range(0..8)));
        avatars.push(coordinator.avatars_mut().allocate(spawn)?);
    }
    for _ in 0..options.observers {
        let client = ClientType::ALL[rng.gen_range(0..ClientType::COUNT)];
        let id = coordinator.register_observer(client, random_coord(&mut rng))?;
        if rng.gen_bool(0.2) {
            coordinator.observer_mut(id)?.set_view_distance(32);
        }
    }

    let start = Instant::now();
    let mut totals = Totals::default();

    for tick in 0..options.ticks {
        for slot in &mut avatars {
            step_avatar(&mut coordinator, slot, &mut rng)?;
        }

        let output = coordinator.tick()?;
        totals.add(&output.report);
        if tick % 10 == 0 {
            tracing::info!(
                "Tick {}: {} packets, {} bytes, {} dirty, {} precomputed",
                output.report.cycle,
                output.packets.len(),
                output.report.bytes,
                output.report.dirty,
                output.report.precompute_runs
            );
        }
        for packet in output.packets {
            coordinator.recycle_packet(packet.bytes);
        }
    }

    let elapsed = start.elapsed();
    let timings = coordinator.timings();
    let pool = coordinator.pool().stats();

    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    SIMULATION RESULTS                            ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ TIMING ────────────────────────────────────────────────────────┐");
    println!("│ Real Time:          {:.2} seconds", elapsed.as_secs_f64());
    println!("│ Min Tick Time:      {} μs", timings.min_tick_us);
    println!("│ Max Tick Time:      {} μs", timings.max_tick_us);
    println!("│ Avg Tick Time:      {} μs", timings.avg_tick_us);
    println!("│ Late Ticks:         {} / {}", timings.late_ticks, timings.total_ticks);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ PACKETS ───────────────────────────────────────────────────────┐");
    println!("│ Bytes Sent:         {}", totals.bytes);
    println!("│ Additions:          {}", totals.additions);
    println!("│ Removals:           {}", totals.removals);
    println!("│ Deferred Avatars:   {}", totals.deferred);
    println!("│ Rejected Fragments: {}", totals.violations);
    println!("│ Precompute Runs:    {}", totals.precompute_runs);
    println!("│ Recycled Indices:   {}", totals.recycled);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();
    println!("┌─ BUFFER POOL ───────────────────────────────────────────────────┐");
    println!("│ Acquired:           {}", pool.acquired);
    println!("│ Reused:             {}", pool.reused);
    println!("│ Retained:           {}", coordinator.pool().retained());
    println!("└──────────────────────────────────────────────────────────────────┘");

    Ok(())
}

/// Applies one tick of random behaviour to the avatar in `slot`.
///
/// Now and then the avatar despawns and a fresh one takes its place.
fn step_avatar(coordinator: &mut TickCoordinator, slot: &mut u16, rng: &mut StdRng) -> InfoResult<()> {
    let index = *slot;
    let avatars = coordinator.avatars_mut();

    match rng.gen_range(0..100) {
        0..=29 => {
            let direction = Direction::from_id(rng.gen_range(0..8));
            avatars.details_mut(index)?.walk(direction);
        }
        30..=39 => {
            let details = avatars.details_mut(index)?;
            details.walk(Direction::from_id(rng.gen_range(0..8)));
            details.walk(Direction::from_id(rng.gen_range(0..8)));
        }
        40..=44 => {
            let destination = random_coord(rng);
            avatars
                .details_mut(index)?
                .teleport_to(0, destination.x(), destination.z(), false);
        }
        45..=54 => avatars
            .extended_info_mut(index)?
            .set_sequence(rng.gen_range(0..9000), rng.gen_range(0..10)),
        55..=57 => avatars
            .extended_info_mut(index)?
            .set_move_speed(rng.gen_range(0..3)),
        58 => avatars.extended_info_mut(index)?.set_name(format!("Wanderer {index}")),
        59 => {
            avatars.release(index)?;
            let spawn = AvatarSpawn::new(rng.gen_range(0..16_000), random_coord(rng));
            *slot = avatars.allocate(spawn)?;
        }
        _ => {}
    }
    Ok(())
}
