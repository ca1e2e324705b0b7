//! Cassandra catalog.
//!
//! Tables are addressed as `<keyspace>.<table>`. Attributes are keyed by
//! `name:zoom` with one column per attribute; tile records by the
//! big-endian key index with one column per layer, `name:zoom`.

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

/// Fully qualified table name.
pub fn qualified_table(keyspace: &str, table: &str) -> String {
    format!("{}.{}", keyspace, table)
}

pub struct CassandraAttributeStore {
    client: Arc<dyn ClusterClient>,
    keyspace: String,
    attribute_table: String,
}

impl CassandraAttributeStore {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        keyspace: impl Into<String>,
        attribute_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            keyspace: keyspace.into(),
            attribute_table: attribute_table.into(),
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    fn table(&self) -> String {
        qualified_table(&self.keyspace, &self.attribute_table)
    }
}

#[async_trait]
impl AttributeStore for CassandraAttributeStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Cassandra
    }

    fn handle(&self) -> BackendHandle {
        BackendHandle::Cassandra {
            client: self.client.clone(),
            keyspace: self.keyspace.clone(),
            attribute_table: self.attribute_table.clone(),
        }
    }

    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value> {
        let table = self.table();
        let context = || format!("reading {} of layer {} from {}", name, id, table);
        let bytes = self
            .client
            .get(&table, layer_row(id).as_bytes(), name)
            .await
            .map_err(|e| CatalogError::backend(context(), e))?
            .ok_or_else(|| CatalogError::not_found(context()))?;
        decode_attribute(&bytes, id, name)
    }

    async fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let rows = self
            .client
            .scan_rows(&self.table(), HEADER_ATTRIBUTE)
            .await
            .map_err(|e| CatalogError::backend("listing layers", e))?;
        let mut ids: Vec<LayerId> = rows.iter().filter_map(|r| parse_layer_row(r)).collect();
        ids.sort();
        Ok(ids)
    }
}

pub struct CassandraValueReader {
    store: Arc<dyn AttributeStore>,
    client: Arc<dyn ClusterClient>,
}

impl CassandraValueReader {
    pub fn new(store: Arc<dyn AttributeStore>, client: Arc<dyn ClusterClient>) -> Self {
        Self { store, client }
    }
}

#[async_trait]
impl ValueReader for CassandraValueReader {
    fn attribute_store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes> {
        let HeaderLocation::Cassandra {
            keyspace,
            tile_table,
        } = &header.location
        else {
            return Err(CatalogError::InvalidAttribute {
                layer: id.clone(),
                attribute: HEADER_ATTRIBUTE.to_string(),
                reason: "not a cassandra layer header".to_string(),
            });
        };
        let table = qualified_table(keyspace, tile_table);
        debug!(table = %table, index, "Reading Cassandra record");
        let context = || format!("reading record {} of layer {} from {}", index, id, table);
        self.client
            .get(&table, &index_row(index), &layer_row(id))
            .await
            .map_err(|e| CatalogError::backend(context(), e))?
            .ok_or_else(|| CatalogError::not_found(context()))
    }
}
