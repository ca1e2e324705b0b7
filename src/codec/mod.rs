//! Binary encodings.
//!
//! - [`wire`]: the tile encoding handed to callers across the process boundary
//! - [`record`]: the layout of tile records inside a backend

pub mod record;
pub mod wire;

pub use record::{decode_record, encode_record, record_kinds, RecordKey, RecordValue};
pub use wire::{decode as decode_tile, encode as encode_tile};

use bytes::Buf;

use crate::error::CodecError;

fn ensure(buf: &&[u8], needed: usize, field: &'static str) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::Truncated {
            field,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

fn read_magic(buf: &mut &[u8], expected: [u8; 4]) -> Result<(), CodecError> {
    ensure(buf, 4, "magic")?;
    let mut found = [0u8; 4];
    buf.copy_to_slice(&mut found);
    if found != expected {
        return Err(CodecError::InvalidMagic { expected, found });
    }
    Ok(())
}
