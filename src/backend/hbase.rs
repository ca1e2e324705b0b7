//! HBase catalog.
//!
//! Attributes: row `name:zoom` of the attribute table, column
//! `attributes:<attribute>`. Tile records: row `name:zoom:` followed by the
//! big-endian key index, column `tiles`, so one layer's records sort
//! together.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use super::cluster::{index_row, layer_row, parse_layer_row, ClusterClient};
use super::{BackendHandle, BackendKind};
use crate::catalog::{decode_attribute, AttributeStore, ValueReader, HEADER_ATTRIBUTE};
use crate::error::{CatalogError, Result};
use crate::layer::{HeaderLocation, LayerHeader, LayerId};

const ATTRIBUTE_FAMILY: &str = "attributes";
const TILE_COLUMN: &str = "tiles";

fn attribute_column(attribute: &str) -> String {
    format!("{}:{}", ATTRIBUTE_FAMILY, attribute)
}

/// Row key of record `index` of layer `id`.
pub fn tile_row(id: &LayerId, index: u64) -> Vec<u8> {
    let mut row = format!("{}:", layer_row(id)).into_bytes();
    row.extend_from_slice(&index_row(index));
    row
}

pub struct HBaseAttributeStore {
    client: Arc<dyn ClusterClient>,
    attribute_table: String,
}

impl HBaseAttributeStore {
    pub fn new(client: Arc<dyn ClusterClient>, attribute_table: impl Into<String>) -> Self {
        Self {
            client,
            attribute_table: attribute_table.into(),
        }
    }
}

#[async_trait]
impl AttributeStore for HBaseAttributeStore {
    fn kind(&self) -> BackendKind {
        BackendKind::HBase
    }

    fn handle(&self) -> BackendHandle {
        BackendHandle::HBase {
            client: self.client.clone(),
            attribute_table: self.attribute_table.clone(),
        }
    }

    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value> {
        let context = || format!("reading {} of layer {} from {}", name, id, self.attribute_table);
        let bytes = self
            .client
            .get(&self.attribute_table, layer_row(id).as_bytes(), &attribute_column(name))
            .await
            .map_err(|e| CatalogError::backend(context(), e))?
            .ok_or_else(|| CatalogError::not_found(context()))?;
        decode_attribute(&bytes, id, name)
    }

    async fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let rows = self
            .client
            .scan_rows(&self.attribute_table, &attribute_column(HEADER_ATTRIBUTE))
            .await
            .map_err(|e| CatalogError::backend("listing layers", e))?;
        let mut ids: Vec<LayerId> = rows.iter().filter_map(|r| parse_layer_row(r)).collect();
        ids.sort();
        Ok(ids)
    }
}

pub struct HBaseValueReader {
    store: Arc<dyn AttributeStore>,
    client: Arc<dyn ClusterClient>,
}

impl HBaseValueReader {
    pub fn new(store: Arc<dyn AttributeStore>, client: Arc<dyn ClusterClient>) -> Self {
        Self { store, client }
    }
}

#[async_trait]
impl ValueReader for HBaseValueReader {
    fn attribute_store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes> {
        let HeaderLocation::HBase { tile_table } = &header.location else {
            return Err(CatalogError::InvalidAttribute {
                layer: id.clone(),
                attribute: HEADER_ATTRIBUTE.to_string(),
                reason: "not an hbase layer header".to_string(),
            });
        };
        debug!(table = %tile_table, index, "Reading HBase record");
        let context = || format!("reading record {} of layer {} from {}", index, id, tile_table);
        self.client
            .get(tile_table, &tile_row(id, index), TILE_COLUMN)
            .await
            .map_err(|e| CatalogError::backend(context(), e))?
            .ok_or_else(|| CatalogError::not_found(context()))
    }
}
