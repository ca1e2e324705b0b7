//! Stored tile records.
//!
//! Ingestion writes one record per key index. Because several keys may map
//! to the same index, a record holds a list of `(key, value)` entries:
//!
//! ```text
//! magic "RTRC" | key kind u8 | value kind u8 | entry count u32
//! per entry: key | value
//! ```
//!
//! Keys are `col i32, row i32[, instant i64]`; values are a band or a tile
//! in the wire layout. The kind tags let a reader refuse a record of the
//! wrong type instead of misreading its bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::wire;
use super::{ensure, read_magic};
use crate::error::CodecError;
use crate::layer::{KeyKind, LayerKey, SpaceTimeKey, SpatialKey, ValueKind};
use crate::raster::{Band, MultibandTile};

pub const RECORD_MAGIC: [u8; 4] = *b"RTRC";

/// A key type that can be written into a record.
pub trait RecordKey: LayerKey {
    fn put(&self, buf: &mut BytesMut);

    fn get(buf: &mut &[u8]) -> Result<Self, CodecError>;
}

impl RecordKey for SpatialKey {
    fn put(&self, buf: &mut BytesMut) {
        buf.put_i32(self.col);
        buf.put_i32(self.row);
    }

    fn get(buf: &mut &[u8]) -> Result<Self, CodecError> {
        ensure(buf, 8, "spatial key")?;
        Ok(SpatialKey::new(buf.get_i32(), buf.get_i32()))
    }
}

impl RecordKey for SpaceTimeKey {
    fn put(&self, buf: &mut BytesMut) {
        buf.put_i32(self.col);
        buf.put_i32(self.row);
        buf.put_i64(self.instant);
    }

    fn get(buf: &mut &[u8]) -> Result<Self, CodecError> {
        ensure(buf, 16, "space-time key")?;
        Ok(SpaceTimeKey::new(buf.get_i32(), buf.get_i32(), buf.get_i64()))
    }
}

/// A value type that can be written into a record.
pub trait RecordValue: Sized {
    const KIND: ValueKind;

    fn put(&self, buf: &mut BytesMut);

    fn get(buf: &mut &[u8]) -> Result<Self, CodecError>;

    /// The canonical multiband shape of this value.
    fn into_multiband(self) -> MultibandTile;
}

impl RecordValue for Band {
    const KIND: ValueKind = ValueKind::SingleBand;

    fn put(&self, buf: &mut BytesMut) {
        wire::put_band(buf, self);
    }

    fn get(buf: &mut &[u8]) -> Result<Self, CodecError> {
        wire::get_band(buf)
    }

    fn into_multiband(self) -> MultibandTile {
        MultibandTile::from(self)
    }
}

impl RecordValue for MultibandTile {
    const KIND: ValueKind = ValueKind::MultiBand;

    fn put(&self, buf: &mut BytesMut) {
        wire::put_tile(buf, self);
    }

    fn get(buf: &mut &[u8]) -> Result<Self, CodecError> {
        wire::get_tile(buf)
    }

    fn into_multiband(self) -> MultibandTile {
        self
    }
}

/// Encode a record of entries sharing one key index.
pub fn encode_record<K: RecordKey, V: RecordValue>(entries: &[(K, V)]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_slice(&RECORD_MAGIC);
    buf.put_u8(K::KIND.tag());
    buf.put_u8(V::KIND.tag());
    buf.put_u32(entries.len() as u32);
    for (key, value) in entries {
        key.put(&mut buf);
        value.put(&mut buf);
    }
    buf.freeze()
}

/// Read the key and value kinds a record was written with.
pub fn record_kinds(bytes: &[u8]) -> Result<(KeyKind, ValueKind), CodecError> {
    let mut buf = bytes;
    read_magic(&mut buf, RECORD_MAGIC)?;
    ensure(&buf, 2, "record kinds")?;
    let key_tag = buf.get_u8();
    let value_tag = buf.get_u8();
    let key = KeyKind::from_tag(key_tag).ok_or(CodecError::UnknownTag {
        field: "key kind",
        tag: key_tag,
    })?;
    let value = ValueKind::from_tag(value_tag).ok_or(CodecError::UnknownTag {
        field: "value kind",
        tag: value_tag,
    })?;
    Ok((key, value))
}

/// Decode a record written with key type `K` and value type `V`.
///
/// # Errors
/// `CodecError::RecordType` if the record was written with other types.
pub fn decode_record<K: RecordKey, V: RecordValue>(bytes: &[u8]) -> Result<Vec<(K, V)>, CodecError> {
    let (key_kind, value_kind) = record_kinds(bytes)?;
    if key_kind != K::KIND || value_kind != V::KIND {
        return Err(CodecError::RecordType {
            expected: format!("{}/{}", K::KIND, V::KIND),
            found: format!("{}/{}", key_kind, value_kind),
        });
    }

    let mut buf = &bytes[RECORD_MAGIC.len() + 2..];
    ensure(&buf, 4, "entry count")?;
    let count = buf.get_u32() as usize;
    let mut entries = Vec::with_capacity(count.min(buf.remaining()));
    for _ in 0..count {
        let key = K::get(&mut buf)?;
        let value = V::get(&mut buf)?;
        entries.push((key, value));
    }
    if buf.has_remaining() {
        return Err(CodecError::TrailingBytes(buf.remaining()));
    }
    Ok(entries)
}
