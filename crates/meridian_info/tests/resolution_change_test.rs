//! Integration test for movement classification and resolution change
//! fragments.

mod common;

use common::sign_extend;
use meridian_core::{BitBuf, BitReader};
use meridian_info::avatar::{classify, Step, StepKind, Teleport};
use meridian_info::{
    Axis, AvatarRepository, AvatarSpawn, Detail, HighResolutionChangeEncoder, InfoError,
    LowResolutionChangeEncoder, ResolutionChange, ResolutionChangeEncoder, TeleJumpPolicy,
};
use meridian_shared::{CoordGrid, Direction, MovementFlags};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_direction(rng: &mut StdRng) -> Direction {
    Direction::from_id(rng.gen_range(0..8))
}

fn random_step(rng: &mut StdRng) -> Step {
    Step {
        direction: random_direction(rng),
        kind: if rng.gen_bool(0.5) {
            StepKind::Walk
        } else {
            StepKind::Crawl
        },
    }
}

#[test]
fn test_classifier_decision_table() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let policy = TeleJumpPolicy::default();

    for _ in 0..500 {
        let step_count = rng.gen_range(0..=2);
        let steps: Vec<Step> = (0..step_count).map(|_| random_step(&mut rng)).collect();
        let teleport = rng.gen_bool(0.3).then(|| {
            let origin = CoordGrid::new(0, rng.gen_range(100..200), rng.gen_range(100..200));
            let destination = CoordGrid::new(
                rng.gen_range(0..2),
                origin.x() + rng.gen_range(0..3),
                origin.z() + rng.gen_range(0..3),
            );
            Teleport {
                origin,
                destination,
                force_jump: rng.gen_bool(0.2),
            }
        });

        let result = classify(&steps, teleport.as_ref(), policy);
        let again = classify(&steps, teleport.as_ref(), policy);
        assert_eq!(result, again);

        let jumps = |t: &Teleport| {
            let (dx, dz) = t.destination.delta_from(t.origin);
            t.force_jump || t.origin.level() != t.destination.level() || dx.abs().max(dz.abs()) > 1
        };
        let expected = match (&teleport, steps.as_slice()) {
            (Some(t), _) if jumps(t) => MovementFlags::TELE | MovementFlags::TELEJUMP,
            (Some(_), _) => MovementFlags::TELE,
            (None, []) => MovementFlags::EMPTY,
            (None, [step]) if step.kind == StepKind::Walk => MovementFlags::WALK,
            (None, [_]) => MovementFlags::CRAWL,
            (None, _) => MovementFlags::RUN,
        };
        assert_eq!(result.flags, expected, "steps {steps:?}, teleport {teleport:?}");

        if teleport.is_none() {
            assert_eq!(result.facing, steps.last().map(|step| step.direction));
        } else {
            assert_eq!(result.facing, None);
        }
    }
}

#[test]
fn test_tele_adjacency() {
    let policy = TeleJumpPolicy::default();
    let origin = CoordGrid::new(0, 3200, 3200);
    let teleport = |destination, force_jump| Teleport {
        origin,
        destination,
        force_jump,
    };

    for destination in [
        origin,
        CoordGrid::new(0, 3201, 3200),
        CoordGrid::new(0, 3199, 3201),
    ] {
        let flags = classify(&[], Some(&teleport(destination, false)), policy).flags;
        assert_eq!(flags, MovementFlags::TELE, "to {destination:?}");
    }

    for destination in [CoordGrid::new(0, 3202, 3200), CoordGrid::new(1, 3200, 3200)] {
        let flags = classify(&[], Some(&teleport(destination, false)), policy).flags;
        assert!(flags.is_jumping(), "to {destination:?}");
    }

    let forced = classify(&[], Some(&teleport(origin, true)), policy).flags;
    assert!(forced.is_jumping());

    let wide = TeleJumpPolicy::new(4);
    let flags = classify(&[], Some(&teleport(CoordGrid::new(0, 3204, 3196), false)), wide).flags;
    assert!(flags.is_tele_without_jump());
}

struct LowFragment {
    index: u32,
    extended_info: bool,
    no_jump: bool,
    dx: i32,
    dz: i32,
    spawn_cycle: Option<u32>,
    type_id: u32,
    direction: u32,
}

fn read_low(bytes: &[u8], width: u8) -> LowFragment {
    let mut reader = BitReader::new(bytes);
    let index = reader.read_bits(16).unwrap();
    let extended_info = reader.read_bool().unwrap();
    let no_jump = reader.read_bool().unwrap();
    let dz = sign_extend(reader.read_bits(width).unwrap(), width);
    let spawn_cycle = if reader.read_bool().unwrap() {
        Some(reader.read_bits(32).unwrap())
    } else {
        None
    };
    let type_id = reader.read_bits(14).unwrap();
    let direction = reader.read_bits(3).unwrap();
    let dx = sign_extend(reader.read_bits(width).unwrap(), width);
    LowFragment {
        index,
        extended_info,
        no_jump,
        dx,
        dz,
        spawn_cycle,
        type_id,
        direction,
    }
}

#[test]
fn test_low_resolution_fragments_decode() {
    let mut rng = StdRng::seed_from_u64(228);
    let mut repository = AvatarRepository::new(256);
    let encoder = LowResolutionChangeEncoder;
    assert_eq!(encoder.detail(), Detail::Low);

    for _ in 0..200 {
        let large_distance = rng.gen_bool(0.5);
        let (width, limit) = if large_distance { (8, 128) } else { (5, 16) };
        let observer = CoordGrid::new(0, rng.gen_range(1000..2000), rng.gen_range(1000..2000));
        let dx = rng.gen_range(-limit..limit);
        let dz = rng.gen_range(-limit..limit);
        #[allow(clippy::cast_sign_loss)]
        let coord = CoordGrid::new(
            0,
            (observer.x() as i32 + dx) as u32,
            (observer.z() as i32 + dz) as u32,
        );
        let spawn_cycle = if rng.gen_bool(0.5) { 0 } else { rng.gen() };
        let type_id = rng.gen_range(0..=16_383);
        let direction = random_direction(&mut rng);

        let spawn = AvatarSpawn::new(type_id, coord)
            .with_spawn_cycle(spawn_cycle)
            .with_direction(direction);
        let index = repository.allocate(spawn).unwrap();
        let details = repository.get(index).unwrap().details();

        let change = ResolutionChange {
            details,
            observer,
            extended_info: rng.gen_bool(0.5),
            large_distance,
            cycle: 1,
        };
        let mut out = BitBuf::new();
        encoder.encode(&change, &mut out).unwrap();
        let spawn_bits = if spawn_cycle == 0 { 0 } else { 32 };
        assert_eq!(out.bit_len(), 16 + 1 + 1 + 1 + spawn_bits + 14 + 3 + 2 * usize::from(width));

        let fragment = read_low(out.as_slice(), width);
        assert_eq!(fragment.index, u32::from(index));
        assert_eq!(fragment.extended_info, change.extended_info);
        assert!(!fragment.no_jump);
        assert_eq!((fragment.dx, fragment.dz), (dx, dz));
        assert_eq!(fragment.spawn_cycle, (spawn_cycle != 0).then_some(spawn_cycle));
        assert_eq!(fragment.type_id, type_id);
        assert_eq!(fragment.direction, u32::from(direction.id()));

        repository.release(index).unwrap();
    }
}

#[test]
fn test_out_of_range_delta_writes_nothing() {
    let mut repository = AvatarRepository::new(4);
    let observer = CoordGrid::new(0, 3200, 3200);
    let encoder = LowResolutionChangeEncoder;

    let edge = repository
        .allocate(AvatarSpawn::new(1, CoordGrid::new(0, 3205, 3200)))
        .unwrap();
    let outside = repository
        .allocate(AvatarSpawn::new(1, CoordGrid::new(0, 3200, 3216)))
        .unwrap();

    let change = |index| ResolutionChange {
        details: repository.get(index).unwrap().details(),
        observer,
        extended_info: false,
        large_distance: false,
        cycle: 0,
    };

    assert!(encoder.check(&change(edge)).is_ok());

    let mut out = BitBuf::new();
    let result = encoder.encode(&change(outside), &mut out);
    assert!(matches!(
        result,
        Err(InfoError::DeltaOutOfRange {
            axis: Axis::Z,
            delta: 16,
            bits: 5
        })
    ));
    assert_eq!(out.bit_len(), 0);

    let wide = ResolutionChange {
        large_distance: true,
        ..change(outside)
    };
    assert!(encoder.check(&wide).is_ok());
}

#[test]
fn test_high_resolution_fragment_decodes() {
    let mut repository = AvatarRepository::new(4);
    let spawn = AvatarSpawn::new(40_000, CoordGrid::new(3, 16_000, 12))
        .with_direction(Direction::NorthWest)
        .with_spawn_cycle(9);
    let index = repository.allocate(spawn).unwrap();
    let encoder = HighResolutionChangeEncoder;
    assert_eq!(encoder.detail(), Detail::High);

    let change = ResolutionChange {
        details: repository.get(index).unwrap().details(),
        observer: CoordGrid::new(0, 0, 0),
        extended_info: true,
        large_distance: false,
        cycle: 0,
    };
    let mut out = BitBuf::new();
    encoder.encode(&change, &mut out).unwrap();

    let mut reader = BitReader::new(out.as_slice());
    assert_eq!(reader.read_bits(16), Some(u32::from(index)));
    assert_eq!(reader.read_bool(), Some(true));
    assert_eq!(reader.read_bool(), Some(false));
    assert_eq!(reader.read_bits(2), Some(3));
    assert_eq!(reader.read_bits(14), Some(12));
    assert_eq!(reader.read_bool(), Some(true));
    assert_eq!(reader.read_bits(32), Some(9));
    // Type ids past the field are clamped.
    assert_eq!(reader.read_bits(14), Some(16_383));
    assert_eq!(reader.read_bits(3), Some(u32::from(Direction::NorthWest.id())));
    assert_eq!(reader.read_bits(14), Some(16_000));
}
