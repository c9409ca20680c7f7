//! Client-side mirror of the avatar info packet, for assertions.

#![allow(dead_code)]

use meridian_core::{BitReader, ByteReader};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    Idle,
    ExtendedInfo,
    Walk(u32),
    Crawl(u32),
    Run(u32, u32),
    Remove,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Position {
    Relative { dx: i32, dz: i32 },
    Absolute { level: u32, x: u32, z: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Addition {
    pub index: u16,
    pub extended_info: bool,
    pub no_jump: bool,
    pub position: Position,
    pub spawn_cycle: Option<u32>,
    pub type_id: u32,
    pub direction: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blocks {
    pub move_speed: Option<u8>,
    pub sequence: Option<(u16, u8)>,
    pub tinting: Option<[u8; 8]>,
    pub name: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct Decoded {
    pub updates: Vec<(u16, Update)>,
    pub additions: Vec<Addition>,
    pub blocks: Vec<(u16, Blocks)>,
}

impl Decoded {
    pub fn update(&self, index: u16) -> Option<&Update> {
        self.updates.iter().find(|(i, _)| *i == index).map(|(_, u)| u)
    }

    pub fn addition(&self, index: u16) -> Option<&Addition> {
        self.additions.iter().find(|a| a.index == index)
    }

    pub fn blocks(&self, index: u16) -> Option<&Blocks> {
        self.blocks.iter().find(|(i, _)| *i == index).map(|(_, b)| b)
    }
}

pub fn sign_extend(value: u32, bits: u8) -> i32 {
    let shift = 32 - u32::from(bits);
    ((value << shift) as i32) >> shift
}

/// Decodes a packet given the indices tracked before it.
pub fn decode(bytes: &[u8], previous: &[u16], large_distance: bool) -> Decoded {
    let width = if large_distance { 8 } else { 5 };
    let mut reader = BitReader::new(bytes);
    let mut decoded = Decoded::default();
    let mut flagged = Vec::new();

    let count = reader.read_bits(8).unwrap() as usize;
    assert_eq!(count, previous.len(), "tracked count mismatch");

    for &index in previous {
        if !reader.read_bool().unwrap() {
            decoded.updates.push((index, Update::Idle));
            continue;
        }
        let update = match reader.read_bits(2).unwrap() {
            0 => {
                assert!(reader.read_bool().unwrap());
                flagged.push(index);
                Update::ExtendedInfo
            }
            1 => {
                let direction = reader.read_bits(3).unwrap();
                if reader.read_bool().unwrap() {
                    flagged.push(index);
                }
                Update::Walk(direction)
            }
            2 => {
                let run = reader.read_bool().unwrap();
                let first = reader.read_bits(3).unwrap();
                let update = if run {
                    Update::Run(first, reader.read_bits(3).unwrap())
                } else {
                    Update::Crawl(first)
                };
                if reader.read_bool().unwrap() {
                    flagged.push(index);
                }
                update
            }
            _ => Update::Remove,
        };
        decoded.updates.push((index, update));
    }

    loop {
        let high = reader.read_bool().unwrap();
        let index = reader.read_bits(16).unwrap();
        if index == 0xFFFF {
            assert!(!high, "terminator carries a low detail bit");
            break;
        }
        let index = index as u16;
        let extended_info = reader.read_bool().unwrap();
        let no_jump = reader.read_bool().unwrap();
        let (level, z_or_dz) = if high {
            (reader.read_bits(2).unwrap(), reader.read_bits(14).unwrap())
        } else {
            (0, reader.read_bits(width).unwrap())
        };
        let spawn_cycle = if reader.read_bool().unwrap() {
            Some(reader.read_bits(32).unwrap())
        } else {
            None
        };
        let type_id = reader.read_bits(14).unwrap();
        let direction = reader.read_bits(3).unwrap();
        let position = if high {
            Position::Absolute {
                level,
                x: reader.read_bits(14).unwrap(),
                z: z_or_dz,
            }
        } else {
            Position::Relative {
                dx: sign_extend(reader.read_bits(width).unwrap(), width),
                dz: sign_extend(z_or_dz, width),
            }
        };
        if extended_info {
            flagged.push(index);
        }
        decoded.additions.push(Addition {
            index,
            extended_info,
            no_jump,
            position,
            spawn_cycle,
            type_id,
            direction,
        });
    }

    let mut bytes = ByteReader::new(&bytes[reader.byte_position()..]);
    for index in flagged {
        let mask = bytes.g1().unwrap();
        let mut blocks = Blocks::default();
        if mask & 0x01 != 0 {
            blocks.move_speed = Some(bytes.g1_alt2().unwrap());
        }
        if mask & 0x02 != 0 {
            blocks.sequence = Some((bytes.g2().unwrap(), bytes.g1_alt1().unwrap()));
        }
        if mask & 0x04 != 0 {
            let mut raw = [0u8; 8];
            for byte in &mut raw {
                *byte = bytes.g1().unwrap();
            }
            blocks.tinting = Some(raw);
        }
        if mask & 0x08 != 0 {
            blocks.name = Some(bytes.gjstr().unwrap().to_vec());
        }
        decoded.blocks.push((index, blocks));
    }
    assert_eq!(bytes.remaining(), 0, "trailing bytes after extended info");

    decoded
}
