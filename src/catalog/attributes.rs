use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::{BackendHandle, BackendKind};
use crate::error::{CatalogError, Result};
use crate::layer::{KeyIndex, KeyKind, LayerHeader, LayerId, LayerMetadata};

/// Attribute holding the layer header.
pub const HEADER_ATTRIBUTE: &str = "header";

/// Attribute holding the layer metadata.
pub const METADATA_ATTRIBUTE: &str = "metadata";

/// Attribute holding the key index.
pub const KEY_INDEX_ATTRIBUTE: &str = "keyIndex";

/// Serialize an attribute the way the catalog stores it: a JSON pair of the
/// layer id and the value.
pub fn encode_attribute(id: &LayerId, value: &Value) -> Vec<u8> {
    serde_json::json!([id, value]).to_string().into_bytes()
}

/// Decode a stored attribute, checking that it belongs to `id`.
pub fn decode_attribute(bytes: &[u8], id: &LayerId, name: &str) -> Result<Value> {
    let (stored_id, value): (LayerId, Value) =
        serde_json::from_slice(bytes).map_err(|e| invalid(id, name, e))?;
    if &stored_id != id {
        return Err(invalid(
            id,
            name,
            format!("attribute was written for layer {}", stored_id),
        ));
    }
    Ok(value)
}

fn invalid(id: &LayerId, attribute: &str, reason: impl ToString) -> CatalogError {
    CatalogError::InvalidAttribute {
        layer: id.clone(),
        attribute: attribute.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T: DeserializeOwned>(id: &LayerId, attribute: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| invalid(id, attribute, e))
}

/// Read access to a catalog's per-layer attributes.
///
/// Backends implement the raw lookups; headers, metadata and key indices
/// are decoded here so every backend interprets them identically.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Connection shared with value readers built from this store.
    fn handle(&self) -> BackendHandle;

    /// Raw JSON value of attribute `name` for `id`.
    ///
    /// # Errors
    /// `NotFound` when the layer has no such attribute.
    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value>;

    /// Every layer id with a header in this catalog.
    async fn layer_ids(&self) -> Result<Vec<LayerId>>;

    async fn read_header(&self, id: &LayerId) -> Result<LayerHeader> {
        let value = self.read_attribute(id, HEADER_ATTRIBUTE).await?;
        let header: LayerHeader = parse(id, HEADER_ATTRIBUTE, value)?;
        let stored = header.location.backend_kind();
        if stored != self.kind() {
            return Err(invalid(
                id,
                HEADER_ATTRIBUTE,
                format!("header describes a {} layer, store is {}", stored, self.kind()),
            ));
        }
        Ok(header)
    }

    /// Metadata of `id`, decoded as the `kind` variant.
    ///
    /// # Errors
    /// `TypeMismatch` when the layer was written with the other key kind.
    async fn read_metadata(&self, id: &LayerId, kind: KeyKind) -> Result<LayerMetadata> {
        let header = self.read_header(id).await?;
        if header.key_class != kind {
            return Err(CatalogError::TypeMismatch {
                layer: id.clone(),
                expected: kind.to_string(),
                found: header.key_class.to_string(),
            });
        }
        let value = self.read_attribute(id, METADATA_ATTRIBUTE).await?;
        LayerMetadata::from_json(value, kind).map_err(|e| invalid(id, METADATA_ATTRIBUTE, e))
    }

    async fn read_key_index(&self, id: &LayerId) -> Result<KeyIndex> {
        let value = self.read_attribute(id, KEY_INDEX_ATTRIBUTE).await?;
        let index: KeyIndex = parse(id, KEY_INDEX_ATTRIBUTE, value)?;
        index
            .validate()
            .map_err(|reason| invalid(id, KEY_INDEX_ATTRIBUTE, reason))?;
        Ok(index)
    }

    async fn layer_exists(&self, id: &LayerId) -> Result<bool> {
        match self.read_attribute(id, HEADER_ATTRIBUTE).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Zoom levels stored for layer `name`, ascending.
    async fn zoom_levels(&self, name: &str) -> Result<Vec<u32>> {
        let zooms: BTreeSet<u32> = self
            .layer_ids()
            .await?
            .into_iter()
            .filter(|id| id.name == name)
            .map(|id| id.zoom)
            .collect();
        Ok(zooms.into_iter().collect())
    }
}
