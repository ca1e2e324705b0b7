use std::path::PathBuf;
use std::sync::Arc;

use aws_sdk_s3::Client;
use tracing::info;

use super::accumulo::{AccumuloAttributeStore, AccumuloValueReader};
use super::cassandra::{CassandraAttributeStore, CassandraValueReader};
use super::cluster::{ClusterClient, ClusterConnector, ClusterTarget};
use super::file::{FileAttributeStore, FileValueReader};
use super::hadoop::{catalog_root, HadoopAttributeStore, HadoopFs, HadoopValueReader, WebHdfsClient};
use super::hbase::{HBaseAttributeStore, HBaseValueReader};
use super::s3::{create_s3_client, S3AttributeStore, S3ValueReader};
use super::{BackendHandle, BackendKind};
use crate::catalog::{AttributeStore, ValueReader};
use crate::config::{BackendConfig, HadoopConfig, OptionBag};
use crate::error::{CatalogError, Result};

/// A matched attribute store and value reader sharing one connection.
#[derive(Clone)]
pub struct Backend {
    pub attribute_store: Arc<dyn AttributeStore>,
    pub value_reader: Arc<dyn ValueReader>,
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        self.attribute_store.kind()
    }
}

/// Builds backends from a kind and an option bag.
///
/// File catalogs need nothing beyond their options. S3 builds a client from
/// the region and endpoint options unless one is supplied. HDFS uses WebHDFS
/// unless a [`HadoopFs`] is supplied. The cluster stores need a
/// [`ClusterConnector`] for their database driver.
#[derive(Clone, Default)]
pub struct BackendFactory {
    connector: Option<Arc<dyn ClusterConnector>>,
    hadoop_fs: Option<Arc<dyn HadoopFs>>,
    s3_client: Option<Client>,
}

impl BackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster_connector(mut self, connector: Arc<dyn ClusterConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_hadoop_fs(mut self, fs: Arc<dyn HadoopFs>) -> Self {
        self.hadoop_fs = Some(fs);
        self
    }

    /// Use `client` for S3 catalogs instead of one built from the options.
    pub fn with_s3_client(mut self, client: Client) -> Self {
        self.s3_client = Some(client);
        self
    }

    /// Resolve `options` for `kind` and build the attribute store and value
    /// reader pair.
    ///
    /// # Errors
    /// `Config` for a missing required option, `Backend` if the connection
    /// cannot be opened.
    pub async fn build(&self, kind: BackendKind, options: &OptionBag) -> Result<Backend> {
        let config = BackendConfig::resolve(kind, options)?;
        let attribute_store = self.attribute_store(&config).await?;
        let value_reader = Self::value_reader_for(attribute_store.clone());
        info!(backend = %kind, "Backend ready");
        Ok(Backend {
            attribute_store,
            value_reader,
        })
    }

    /// Build the attribute store for a resolved configuration.
    pub async fn attribute_store(&self, config: &BackendConfig) -> Result<Arc<dyn AttributeStore>> {
        let store: Arc<dyn AttributeStore> = match config {
            BackendConfig::File(c) => Arc::new(FileAttributeStore::new(PathBuf::from(&c.path))),
            BackendConfig::Hadoop(c) => {
                let root = catalog_root(&c.uri)?;
                Arc::new(HadoopAttributeStore::new(self.hadoop_fs(c)?, root))
            }
            BackendConfig::S3(c) => {
                let client = match &self.s3_client {
                    Some(client) => client.clone(),
                    None => create_s3_client(c.endpoint.as_deref(), &c.region).await,
                };
                Arc::new(S3AttributeStore::new(client, &c.bucket, &c.prefix))
            }
            BackendConfig::Accumulo(c) => {
                let client = self.connect(ClusterTarget::Accumulo(c)).await?;
                Arc::new(AccumuloAttributeStore::new(client, &c.attribute_table))
            }
            BackendConfig::HBase(c) => {
                let client = self.connect(ClusterTarget::HBase(c)).await?;
                Arc::new(HBaseAttributeStore::new(client, &c.attribute_table))
            }
            BackendConfig::Cassandra(c) => {
                let client = self.connect(ClusterTarget::Cassandra(c)).await?;
                Arc::new(CassandraAttributeStore::new(client, &c.keyspace, &c.attribute_table))
            }
        };
        Ok(store)
    }

    /// Build a value reader on the connection `store` already holds.
    pub fn value_reader_for(store: Arc<dyn AttributeStore>) -> Arc<dyn ValueReader> {
        let handle = store.handle();
        match handle {
            BackendHandle::File { root } => Arc::new(FileValueReader::new(store, root)),
            BackendHandle::Hadoop { fs, root } => Arc::new(HadoopValueReader::new(store, fs, root)),
            BackendHandle::S3 { client, .. } => Arc::new(S3ValueReader::new(store, client)),
            BackendHandle::Accumulo { client, .. } => {
                Arc::new(AccumuloValueReader::new(store, client))
            }
            BackendHandle::HBase { client, .. } => Arc::new(HBaseValueReader::new(store, client)),
            BackendHandle::Cassandra { client, .. } => {
                Arc::new(CassandraValueReader::new(store, client))
            }
        }
    }

    fn hadoop_fs(&self, config: &HadoopConfig) -> Result<Arc<dyn HadoopFs>> {
        match &self.hadoop_fs {
            Some(fs) => Ok(fs.clone()),
            None => Ok(Arc::new(WebHdfsClient::new(config)?)),
        }
    }

    async fn connect(&self, target: ClusterTarget<'_>) -> Result<Arc<dyn ClusterClient>> {
        let connector = self.connector.as_ref().ok_or_else(|| {
            CatalogError::config(format!(
                "no cluster connector configured for the {} backend",
                target.kind()
            ))
        })?;
        connector
            .connect(target)
            .await
            .map_err(|e| CatalogError::backend(format!("connecting to {}", target.kind()), e))
    }
}
