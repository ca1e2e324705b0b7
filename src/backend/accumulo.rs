//! Accumulo catalog.
//!
//! Attributes live in one table, row `name:zoom`, column qualifier named
//! after the attribute. Tile records live in the header's tile table, row
//! key the big-endian key index, column `name:zoom`.

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

pub struct AccumuloAttributeStore {
    client: Arc<dyn ClusterClient>,
    attribute_table: String,
}

impl AccumuloAttributeStore {
    pub fn new(client: Arc<dyn ClusterClient>, attribute_table: impl Into<String>) -> Self {
        Self {
            client,
            attribute_table: attribute_table.into(),
        }
    }

    pub fn attribute_table(&self) -> &str {
        &self.attribute_table
    }
}

#[async_trait]
impl AttributeStore for AccumuloAttributeStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Accumulo
    }

    fn handle(&self) -> BackendHandle {
        BackendHandle::Accumulo {
            client: self.client.clone(),
            attribute_table: self.attribute_table.clone(),
        }
    }

    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value> {
        let context = || format!("reading {} of layer {} from {}", name, id, self.attribute_table);
        let bytes = self
            .client
            .get(&self.attribute_table, layer_row(id).as_bytes(), name)
            .await
            .map_err(|e| CatalogError::backend(context(), e))?
            .ok_or_else(|| CatalogError::not_found(context()))?;
        decode_attribute(&bytes, id, name)
    }

    async fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let rows = self
            .client
            .scan_rows(&self.attribute_table, HEADER_ATTRIBUTE)
            .await
            .map_err(|e| CatalogError::backend("listing layers", e))?;
        let mut ids: Vec<LayerId> = rows.iter().filter_map(|r| parse_layer_row(r)).collect();
        ids.sort();
        Ok(ids)
    }
}

pub struct AccumuloValueReader {
    store: Arc<dyn AttributeStore>,
    client: Arc<dyn ClusterClient>,
}

impl AccumuloValueReader {
    pub fn new(store: Arc<dyn AttributeStore>, client: Arc<dyn ClusterClient>) -> Self {
        Self { store, client }
    }
}

#[async_trait]
impl ValueReader for AccumuloValueReader {
    fn attribute_store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes> {
        let HeaderLocation::Accumulo { tile_table } = &header.location else {
            return Err(CatalogError::InvalidAttribute {
                layer: id.clone(),
                attribute: HEADER_ATTRIBUTE.to_string(),
                reason: "not an accumulo layer header".to_string(),
            });
        };
        debug!(table = %tile_table, index, "Reading Accumulo record");
        let context = || format!("reading record {} of layer {} from {}", index, id, tile_table);
        self.client
            .get(tile_table, &index_row(index), &layer_row(id))
            .await
            .map_err(|e| CatalogError::backend(context(), e))?
            .ok_or_else(|| CatalogError::not_found(context()))
    }
}
