//! Client seam for the column-family stores (Accumulo, HBase, Cassandra).
//!
//! The three cluster adapters only need two operations from their
//! database: a point read of one cell and a scan of the row keys that carry
//! a given column. [`ClusterClient`] captures exactly that, and a
//! [`ClusterConnector`] opens a client for a resolved configuration.
//! Drivers for the real databases plug in here; [`InMemoryCluster`] is a
//! complete in-process implementation used for tests and local catalogs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::BackendKind;
use crate::config::{AccumuloConfig, CassandraConfig, HBaseConfig};
use crate::error::BackendError;
use crate::layer::LayerId;

/// Row and column addressed reads against a cluster store.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Value of `column` in `row` of `table`, or `None` if the cell is empty.
    async fn get(&self, table: &str, row: &[u8], column: &str) -> Result<Option<Bytes>, BackendError>;

    /// Row keys of `table` that have a value in `column`.
    async fn scan_rows(&self, table: &str, column: &str) -> Result<Vec<Vec<u8>>, BackendError>;
}

/// Which store a connector is asked to reach, with its configuration.
#[derive(Debug, Clone, Copy)]
pub enum ClusterTarget<'a> {
    Accumulo(&'a AccumuloConfig),
    HBase(&'a HBaseConfig),
    Cassandra(&'a CassandraConfig),
}

impl ClusterTarget<'_> {
    pub fn kind(&self) -> BackendKind {
        match self {
            ClusterTarget::Accumulo(_) => BackendKind::Accumulo,
            ClusterTarget::HBase(_) => BackendKind::HBase,
            ClusterTarget::Cassandra(_) => BackendKind::Cassandra,
        }
    }
}

/// Opens cluster clients for the factory.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn connect(&self, target: ClusterTarget<'_>) -> Result<Arc<dyn ClusterClient>, BackendError>;
}

/// Row key of a tile record: the key index as 8 big-endian bytes.
pub fn index_row(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

/// Row key of a layer's attributes: `name:zoom`.
pub fn layer_row(id: &LayerId) -> String {
    id.to_string()
}

pub fn parse_layer_row(row: &[u8]) -> Option<LayerId> {
    std::str::from_utf8(row).ok()?.parse().ok()
}

type Table = BTreeMap<(Vec<u8>, String), Bytes>;

/// In-process cluster store.
///
/// Cloning shares the underlying tables, so a test can keep one handle to
/// seed data while the catalog reads through another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, table: &str, row: impl AsRef<[u8]>, column: &str, value: impl Into<Bytes>) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables
            .entry(table.to_string())
            .or_default()
            .insert((row.as_ref().to_vec(), column.to_string()), value.into());
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn get(&self, table: &str, row: &[u8], column: &str) -> Result<Option<Bytes>, BackendError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let table = tables
            .get(table)
            .ok_or_else(|| BackendError::Cluster(format!("table '{}' does not exist", table)))?;
        Ok(table.get(&(row.to_vec(), column.to_string())).cloned())
    }

    async fn scan_rows(&self, table: &str, column: &str) -> Result<Vec<Vec<u8>>, BackendError> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let table = tables
            .get(table)
            .ok_or_else(|| BackendError::Cluster(format!("table '{}' does not exist", table)))?;
        Ok(table
            .keys()
            .filter(|(_, c)| c == column)
            .map(|(r, _)| r.clone())
            .collect())
    }
}

#[async_trait]
impl ClusterConnector for InMemoryCluster {
    async fn connect(&self, _target: ClusterTarget<'_>) -> Result<Arc<dyn ClusterClient>, BackendError> {
        Ok(Arc::new(self.clone()))
    }
}
