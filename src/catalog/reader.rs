use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::attributes::AttributeStore;
use super::dispatch::ReadPath;
use crate::codec::encode_tile;
use crate::error::{CatalogError, Result};
use crate::layer::{Key, KeyKind, LayerHeader, LayerId, SpaceTimeKey, SpatialKey, ValueKind};
use crate::raster::MultibandTile;

/// A point lookup of one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRequest {
    pub key_kind: KeyKind,
    pub layer_name: String,
    pub zoom: u32,
    pub col: i32,
    pub row: i32,
    /// ISO-8601 instant; required for temporal requests, ignored otherwise
    #[serde(default)]
    pub instant: Option<String>,
}

impl TileRequest {
    pub fn spatial(layer_name: impl Into<String>, zoom: u32, col: i32, row: i32) -> Self {
        Self {
            key_kind: KeyKind::Spatial,
            layer_name: layer_name.into(),
            zoom,
            col,
            row,
            instant: None,
        }
    }

    pub fn temporal(
        layer_name: impl Into<String>,
        zoom: u32,
        col: i32,
        row: i32,
        instant: impl Into<String>,
    ) -> Self {
        Self {
            key_kind: KeyKind::Temporal,
            layer_name: layer_name.into(),
            zoom,
            col,
            row,
            instant: Some(instant.into()),
        }
    }

    pub fn layer_id(&self) -> LayerId {
        LayerId::new(self.layer_name.clone(), self.zoom)
    }

    /// Build the key this request addresses.
    ///
    /// # Errors
    /// `Config` when a temporal request has no instant or an unparseable one.
    pub fn key(&self) -> Result<Key> {
        match self.key_kind {
            KeyKind::Spatial => Ok(Key::Spatial(SpatialKey::new(self.col, self.row))),
            KeyKind::Temporal => {
                let instant = self
                    .instant
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        CatalogError::config(format!(
                            "temporal read of layer {} requires an instant",
                            self.layer_id()
                        ))
                    })?;
                Ok(Key::SpaceTime(SpaceTimeKey::at(self.col, self.row, instant)?))
            }
        }
    }
}

/// Point reads of tiles from one backend.
///
/// Implementors provide the single backend operation, fetching the stored
/// record at a key index. Header resolution, type dispatch, the single-band
/// lift and wire encoding are shared.
#[async_trait]
pub trait ValueReader: Send + Sync {
    /// The attribute store this reader resolves headers through.
    fn attribute_store(&self) -> &Arc<dyn AttributeStore>;

    /// Fetch the raw record stored at `index` for the layer described by `header`.
    ///
    /// # Errors
    /// `NotFound` when no record exists at that index.
    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes>;

    async fn value_class(&self, id: &LayerId) -> Result<ValueKind> {
        Ok(self.attribute_store().read_header(id).await?.value_class)
    }

    /// Read one tile as a multiband tile.
    async fn read_multiband(&self, request: &TileRequest) -> Result<MultibandTile> {
        let id = request.layer_id();
        let store = self.attribute_store();

        let header = store.read_header(&id).await?;
        let path = ReadPath::select(&id, request.key_kind, &header)?;
        let key = request.key()?;

        let key_index = store.read_key_index(&id).await?;
        if key_index.kind() != path.key_kind() {
            return Err(CatalogError::InvalidAttribute {
                layer: id,
                attribute: super::KEY_INDEX_ATTRIBUTE.to_string(),
                reason: format!(
                    "key index is for {} but header declares {}",
                    key_index.kind(),
                    header.key_class
                ),
            });
        }
        let lookup = format!("{} of {} layer {}", key, header.value_class, id);
        let index = key_index
            .index_of(&key)
            .ok_or_else(|| CatalogError::not_found(lookup.clone()))?;

        debug!(
            layer = %id,
            key = %key,
            index,
            path = ?path,
            backend = %store.kind(),
            "Reading tile record"
        );

        let record = self
            .fetch_record(&id, &header, index)
            .await
            .map_err(|e| e.in_lookup(&lookup))?;
        path.lookup(&id, &key, &record)
    }

    /// Read one tile and return it wire-encoded.
    async fn read_tile(&self, request: &TileRequest) -> Result<Bytes> {
        let tile = self.read_multiband(request).await?;
        Ok(encode_tile(&tile))
    }
}
