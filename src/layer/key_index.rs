use serde::{Deserialize, Serialize};

use super::key::{Key, SpaceTimeKey, SpatialKey};
use super::KeyKind;

/// Largest coordinate a 3D Z-order curve can hold (21 bits per dimension).
const MAX_3D_COORD: u64 = (1 << 21) - 1;

/// Maps a tile key onto the `u64` index its record is stored under.
///
/// Both variants are Z-order (Morton) curves: spatial keys interleave
/// column and row, space-time keys interleave column, row and a time bucket
/// of `temporal_resolution_millis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum KeyIndex {
    Zorder,
    ZorderTime {
        #[serde(rename = "temporalResolutionMillis")]
        temporal_resolution_millis: i64,
    },
}

impl KeyIndex {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyIndex::Zorder => KeyKind::Spatial,
            KeyIndex::ZorderTime { .. } => KeyKind::Temporal,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            KeyIndex::ZorderTime {
                temporal_resolution_millis,
            } if *temporal_resolution_millis <= 0 => Err(format!(
                "temporal resolution must be positive, got {}",
                temporal_resolution_millis
            )),
            _ => Ok(()),
        }
    }

    /// Index of `key`, or `None` when the key is off the curve (negative
    /// coordinates, coordinates too large, or a key of the other kind).
    pub fn index_of(&self, key: &Key) -> Option<u64> {
        match (self, key) {
            (KeyIndex::Zorder, Key::Spatial(k)) => spatial_index(k),
            (
                KeyIndex::ZorderTime {
                    temporal_resolution_millis,
                },
                Key::SpaceTime(k),
            ) => space_time_index(k, *temporal_resolution_millis),
            _ => None,
        }
    }
}

fn spatial_index(key: &SpatialKey) -> Option<u64> {
    let col = u32::try_from(key.col).ok()?;
    let row = u32::try_from(key.row).ok()?;
    Some(spread2(col) | (spread2(row) << 1))
}

fn space_time_index(key: &SpaceTimeKey, resolution: i64) -> Option<u64> {
    if resolution <= 0 {
        return None;
    }
    let col = u64::try_from(key.col).ok()?;
    let row = u64::try_from(key.row).ok()?;
    let bucket = u64::try_from(key.instant.div_euclid(resolution)).ok()?;
    if col > MAX_3D_COORD || row > MAX_3D_COORD || bucket > MAX_3D_COORD {
        return None;
    }
    Some(spread3(col) | (spread3(row) << 1) | (spread3(bucket) << 2))
}

/// Spread the 32 bits of `v` over the even bits of a u64.
fn spread2(v: u32) -> u64 {
    let mut x = v as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Spread the low 21 bits of `v` over every third bit of a u64.
fn spread3(v: u64) -> u64 {
    let mut x = v & MAX_3D_COORD;
    x = (x | (x << 32)) & 0x001F_0000_0000_FFFF;
    x = (x | (x << 16)) & 0x001F_0000_FF00_00FF;
    x = (x | (x << 8)) & 0x100F_00F0_0F00_F00F;
    x = (x | (x << 4)) & 0x10C3_0C30_C30C_30C3;
    x = (x | (x << 2)) & 0x1249_2492_4924_9249;
    x
}
