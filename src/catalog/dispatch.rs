use crate::codec::{decode_record, RecordKey, RecordValue};
use crate::error::{CatalogError, CodecError, Result};
use crate::layer::{Key, KeyKind, LayerHeader, LayerId, SpaceTimeKey, SpatialKey, ValueKind};
use crate::raster::{Band, MultibandTile};

/// Decodes a stored record and picks out the tile for one key.
pub type LookupFn = fn(&LayerId, &Key, &[u8]) -> Result<MultibandTile>;

/// The four supported `(key kind, value kind)` combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadPath {
    SpatialSingleBand,
    SpatialMultiBand,
    TemporalSingleBand,
    TemporalMultiBand,
}

impl ReadPath {
    pub fn new(key: KeyKind, value: ValueKind) -> Self {
        match (key, value) {
            (KeyKind::Spatial, ValueKind::SingleBand) => ReadPath::SpatialSingleBand,
            (KeyKind::Spatial, ValueKind::MultiBand) => ReadPath::SpatialMultiBand,
            (KeyKind::Temporal, ValueKind::SingleBand) => ReadPath::TemporalSingleBand,
            (KeyKind::Temporal, ValueKind::MultiBand) => ReadPath::TemporalMultiBand,
        }
    }

    /// Read path for a request of key kind `requested` against a layer
    /// described by `header`.
    ///
    /// # Errors
    /// `TypeMismatch` when the layer stores the other key kind.
    pub fn select(id: &LayerId, requested: KeyKind, header: &LayerHeader) -> Result<Self> {
        if requested != header.key_class {
            return Err(CatalogError::TypeMismatch {
                layer: id.clone(),
                expected: format!("{}/{}", requested, header.value_class),
                found: format!("{}/{}", header.key_class, header.value_class),
            });
        }
        Ok(Self::new(header.key_class, header.value_class))
    }

    pub fn key_kind(&self) -> KeyKind {
        match self {
            ReadPath::SpatialSingleBand | ReadPath::SpatialMultiBand => KeyKind::Spatial,
            ReadPath::TemporalSingleBand | ReadPath::TemporalMultiBand => KeyKind::Temporal,
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            ReadPath::SpatialSingleBand | ReadPath::TemporalSingleBand => ValueKind::SingleBand,
            ReadPath::SpatialMultiBand | ReadPath::TemporalMultiBand => ValueKind::MultiBand,
        }
    }

    pub fn lookup_fn(&self) -> LookupFn {
        match self {
            ReadPath::SpatialSingleBand => lookup::<SpatialKey, Band>,
            ReadPath::SpatialMultiBand => lookup::<SpatialKey, MultibandTile>,
            ReadPath::TemporalSingleBand => lookup::<SpaceTimeKey, Band>,
            ReadPath::TemporalMultiBand => lookup::<SpaceTimeKey, MultibandTile>,
        }
    }

    /// Decode `record` along this path and return the tile stored for `key`,
    /// lifted to multiband.
    pub fn lookup(&self, id: &LayerId, key: &Key, record: &[u8]) -> Result<MultibandTile> {
        (self.lookup_fn())(id, key, record)
    }
}

fn lookup<K: RecordKey, V: RecordValue>(
    id: &LayerId,
    key: &Key,
    record: &[u8],
) -> Result<MultibandTile> {
    let wanted = K::from_key(key).ok_or_else(|| CatalogError::TypeMismatch {
        layer: id.clone(),
        expected: K::KIND.to_string(),
        found: key.kind().to_string(),
    })?;

    let entries = decode_record::<K, V>(record).map_err(|e| match e {
        CodecError::RecordType { expected, found } => CatalogError::TypeMismatch {
            layer: id.clone(),
            expected,
            found,
        },
        e => CatalogError::Codec(e),
    })?;

    entries
        .into_iter()
        .find(|(k, _)| *k == wanted)
        .map(|(_, value)| value.into_multiband())
        .ok_or_else(|| CatalogError::not_found(format!("{} of {} layer {}", key, V::KIND, id)))
}
