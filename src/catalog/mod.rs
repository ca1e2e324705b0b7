//! Catalog access: the attribute store and value reader interfaces shared
//! by every backend.
//!
//! A read goes through four steps:
//!
//! 1. The layer header is read to learn its key and value kinds.
//! 2. The `(key kind, value kind)` pair selects one of four [`ReadPath`]s,
//!    or fails with a type mismatch when the request's key kind differs.
//! 3. The request is turned into a [`Key`](crate::layer::Key).
//! 4. The backend fetches the record at the key's index, and the path
//!    decodes it, lifts single-band values and hands back a multiband tile.

mod attributes;
mod dispatch;
mod reader;

pub use attributes::{
    decode_attribute, encode_attribute, AttributeStore, HEADER_ATTRIBUTE, KEY_INDEX_ATTRIBUTE,
    METADATA_ATTRIBUTE,
};
pub use dispatch::{LookupFn, ReadPath};
pub use reader::{TileRequest, ValueReader};
