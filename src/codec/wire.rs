//! Tile wire codec.
//!
//! Self-describing, lossless encoding of a [`MultibandTile`]. All integers
//! are big-endian:
//!
//! ```text
//! magic "RTMB" | version u8 | band count u32
//! per band:
//!   cell kind u8 | no-data tag u8 | no-data value u64
//!   cols u32 | rows u32 | payload length u32 | payload
//! ```
//!
//! The no-data tag is 0 (raw), 1 (the kind's constant) or 2 (user-defined);
//! the value field holds the user-defined value as `f64` bits for float
//! kinds and as a sign-extended `i64` for integer kinds, and zero otherwise.
//! Payloads are the band's raw row-major cells.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ensure, read_magic};
use crate::error::CodecError;
use crate::raster::{Band, CellKind, CellType, MultibandTile, NoData};

pub const TILE_MAGIC: [u8; 4] = *b"RTMB";
pub const TILE_VERSION: u8 = 1;

const BAND_HEADER_LEN: usize = 1 + 1 + 8 + 4 + 4 + 4;

/// Encode a tile.
pub fn encode(tile: &MultibandTile) -> Bytes {
    let payload: usize = tile.bands().iter().map(|b| BAND_HEADER_LEN + b.data().len()).sum();
    let mut buf = BytesMut::with_capacity(4 + 1 + 4 + payload);
    buf.put_slice(&TILE_MAGIC);
    buf.put_u8(TILE_VERSION);
    buf.put_u32(tile.band_count() as u32);
    for band in tile.bands() {
        put_band(&mut buf, band);
    }
    buf.freeze()
}

/// Decode a tile, rejecting truncated or trailing input.
pub fn decode(bytes: &[u8]) -> Result<MultibandTile, CodecError> {
    let mut buf = bytes;
    let tile = get_tile(&mut buf)?;
    if buf.has_remaining() {
        return Err(CodecError::TrailingBytes(buf.remaining()));
    }
    Ok(tile)
}

pub(crate) fn put_tile(buf: &mut BytesMut, tile: &MultibandTile) {
    buf.put_slice(&encode(tile));
}

pub(crate) fn get_tile(buf: &mut &[u8]) -> Result<MultibandTile, CodecError> {
    read_magic(buf, TILE_MAGIC)?;
    ensure(buf, 1 + 4, "tile header")?;
    let version = buf.get_u8();
    if version != TILE_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let count = buf.get_u32() as usize;
    if count == 0 {
        return Err(CodecError::NoBands);
    }
    // Each band needs at least its header, so a huge count cannot allocate.
    ensure(buf, count.saturating_mul(BAND_HEADER_LEN), "band headers")?;
    let mut bands = Vec::with_capacity(count);
    for _ in 0..count {
        bands.push(get_band(buf)?);
    }
    MultibandTile::new(bands)
}

pub(crate) fn put_band(buf: &mut BytesMut, band: &Band) {
    let cell_type = band.cell_type();
    let kind = cell_type.kind();
    buf.put_u8(kind.tag());
    match cell_type.no_data() {
        NoData::Raw => {
            buf.put_u8(0);
            buf.put_u64(0);
        }
        NoData::Constant => {
            buf.put_u8(1);
            buf.put_u64(0);
        }
        NoData::UserDefined(v) if kind.is_floating_point() => {
            buf.put_u8(2);
            buf.put_u64(v.to_bits());
        }
        NoData::UserDefined(v) => {
            buf.put_u8(2);
            buf.put_i64(v as i64);
        }
    }
    buf.put_u32(band.cols());
    buf.put_u32(band.rows());
    buf.put_u32(band.data().len() as u32);
    buf.put_slice(band.data());
}

pub(crate) fn get_band(buf: &mut &[u8]) -> Result<Band, CodecError> {
    ensure(buf, BAND_HEADER_LEN, "band header")?;
    let tag = buf.get_u8();
    let kind = CellKind::from_tag(tag).ok_or(CodecError::UnknownTag {
        field: "cell kind",
        tag,
    })?;
    let no_data_tag = buf.get_u8();
    let raw_value = buf.get_u64();
    let no_data = match no_data_tag {
        0 => NoData::Raw,
        1 => NoData::Constant,
        2 if kind.is_floating_point() => NoData::UserDefined(f64::from_bits(raw_value)),
        2 => NoData::UserDefined(raw_value as i64 as f64),
        tag => {
            return Err(CodecError::UnknownTag {
                field: "no-data",
                tag,
            })
        }
    };
    let cell_type = CellType::new(kind, no_data).map_err(CodecError::InvalidCellType)?;
    let cols = buf.get_u32();
    let rows = buf.get_u32();
    let len = buf.get_u32() as usize;
    ensure(buf, len, "band payload")?;
    let data = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(len);
    Band::new(cell_type, cols, rows, data)
}
