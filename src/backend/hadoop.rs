//! HDFS catalog, reached through the namenode's WebHDFS REST interface.
//!
//! ```text
//! <root>/_attributes/<attribute>__<name>__<zoom>.json
//! <header path>/<key index>
//! ```
//!
//! The root is the path component of the configured `hdfs://` URI. Header
//! paths may be absolute, full `hdfs://` URIs, or relative to the root.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{BackendHandle, BackendKind};
use crate::catalog::{decode_attribute, AttributeStore, ValueReader, HEADER_ATTRIBUTE};
use crate::config::HadoopConfig;
use crate::error::{BackendError, CatalogError, Result};
use crate::layer::{HeaderLocation, LayerHeader, LayerId};

const ATTRIBUTE_DIR: &str = "_attributes";

/// Minimal read-only filesystem operations the HDFS catalog needs.
#[async_trait]
pub trait HadoopFs: Send + Sync {
    /// Whole contents of the file at absolute `path`.
    async fn read(&self, path: &str) -> Result<Bytes, BackendError>;

    /// Names of the entries directly under the directory at `path`.
    async fn list(&self, path: &str) -> Result<Vec<String>, BackendError>;
}

// =============================================================================
// WebHDFS Client
// =============================================================================

#[derive(Deserialize)]
struct ListStatusResponse {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus")]
    file_status: Vec<FileStatus>,
}

#[derive(Deserialize)]
struct FileStatus {
    #[serde(rename = "pathSuffix")]
    path_suffix: String,
}

/// [`HadoopFs`] over WebHDFS.
#[derive(Debug, Clone)]
pub struct WebHdfsClient {
    http: reqwest::Client,
    base: Url,
    user: String,
}

impl WebHdfsClient {
    /// Build a client for the namenode named in `config.uri`.
    pub fn new(config: &HadoopConfig) -> Result<Self> {
        let uri = parse_hdfs_uri(&config.uri)?;
        let host = uri.host_str().ok_or_else(|| {
            CatalogError::config(format!("HDFS URI '{}' has no namenode host", config.uri))
        })?;
        let base = Url::parse(&format!(
            "http://{}:{}/webhdfs/v1/",
            host, config.webhdfs_port
        ))
        .map_err(|e| CatalogError::config(format!("invalid WebHDFS address: {}", e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            user: config.user.clone(),
        })
    }

    fn url(&self, path: &str, op: &str) -> Result<Url, BackendError> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::Http(format!("invalid path '{}': {}", path, e)))?;
        url.query_pairs_mut()
            .append_pair("op", op)
            .append_pair("user.name", &self.user);
        Ok(url)
    }

    async fn send(&self, path: &str, op: &str) -> Result<reqwest::Response, BackendError> {
        let url = self.url(path, op)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(format!("hdfs://{}", path)));
        }
        if !status.is_success() {
            return Err(BackendError::Http(format!("{} {} for {}", op, status, path)));
        }
        Ok(response)
    }
}

#[async_trait]
impl HadoopFs for WebHdfsClient {
    async fn read(&self, path: &str) -> Result<Bytes, BackendError> {
        self.send(path, "OPEN")
            .await?
            .bytes()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))
    }

    async fn list(&self, path: &str) -> Result<Vec<String>, BackendError> {
        let body = self
            .send(path, "LISTSTATUS")
            .await?
            .bytes()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;
        let listing: ListStatusResponse = serde_json::from_slice(&body)
            .map_err(|e| BackendError::Http(format!("malformed LISTSTATUS response: {}", e)))?;
        Ok(listing
            .file_statuses
            .file_status
            .into_iter()
            .map(|s| s.path_suffix)
            .collect())
    }
}

fn parse_hdfs_uri(uri: &str) -> Result<Url> {
    let url = Url::parse(uri)
        .map_err(|e| CatalogError::config(format!("invalid HDFS URI '{}': {}", uri, e)))?;
    if url.scheme() != "hdfs" {
        return Err(CatalogError::config(format!(
            "HDFS URI '{}' must use the hdfs:// scheme",
            uri
        )));
    }
    Ok(url)
}

/// Catalog root directory named by an `hdfs://` URI.
pub fn catalog_root(uri: &str) -> Result<String> {
    let path = parse_hdfs_uri(uri)?.path().trim_end_matches('/').to_string();
    Ok(if path.is_empty() { "/".to_string() } else { path })
}

fn join(root: &str, child: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), child)
}

/// Absolute filesystem path of a header path.
fn resolve_path(root: &str, path: &str) -> String {
    if let Ok(url) = Url::parse(path) {
        if url.scheme() == "hdfs" {
            return url.path().to_string();
        }
    }
    if path.starts_with('/') {
        path.to_string()
    } else {
        join(root, path)
    }
}

fn attribute_file_name(id: &LayerId, attribute: &str) -> String {
    format!("{}__{}__{}.json", attribute, id.name, id.zoom)
}

fn parse_header_file_name(file_name: &str) -> Option<LayerId> {
    let stem = file_name
        .strip_prefix(HEADER_ATTRIBUTE)?
        .strip_prefix("__")?
        .strip_suffix(".json")?;
    let (name, zoom) = stem.rsplit_once("__")?;
    Some(LayerId::new(name, zoom.parse().ok()?))
}

// =============================================================================
// Attribute Store and Value Reader
// =============================================================================

pub struct HadoopAttributeStore {
    fs: Arc<dyn HadoopFs>,
    root: String,
}

impl HadoopAttributeStore {
    pub fn new(fs: Arc<dyn HadoopFs>, root: impl Into<String>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn attribute_dir(&self) -> String {
        join(&self.root, ATTRIBUTE_DIR)
    }
}

#[async_trait]
impl AttributeStore for HadoopAttributeStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Hadoop
    }

    fn handle(&self) -> BackendHandle {
        BackendHandle::Hadoop {
            fs: self.fs.clone(),
            root: self.root.clone(),
        }
    }

    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value> {
        let path = join(&self.attribute_dir(), &attribute_file_name(id, name));
        let bytes = self.fs.read(&path).await.map_err(|e| {
            CatalogError::backend(format!("reading {} of layer {} from {}", name, id, path), e)
        })?;
        decode_attribute(&bytes, id, name)
    }

    async fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let dir = self.attribute_dir();
        let names = match self.fs.list(&dir).await {
            Ok(names) => names,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(CatalogError::backend(format!("listing layers in {}", dir), e)),
        };
        let mut ids: Vec<LayerId> = names
            .iter()
            .filter_map(|n| parse_header_file_name(n))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

pub struct HadoopValueReader {
    store: Arc<dyn AttributeStore>,
    fs: Arc<dyn HadoopFs>,
    root: String,
}

impl HadoopValueReader {
    pub fn new(store: Arc<dyn AttributeStore>, fs: Arc<dyn HadoopFs>, root: impl Into<String>) -> Self {
        Self {
            store,
            fs,
            root: root.into(),
        }
    }
}

#[async_trait]
impl ValueReader for HadoopValueReader {
    fn attribute_store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes> {
        let HeaderLocation::Hdfs { path } = &header.location else {
            return Err(CatalogError::InvalidAttribute {
                layer: id.clone(),
                attribute: HEADER_ATTRIBUTE.to_string(),
                reason: "not an hdfs layer header".to_string(),
            });
        };
        let record = join(&resolve_path(&self.root, path), &index.to_string());
        debug!(path = %record, "Reading HDFS record");
        self.fs.read(&record).await.map_err(|e| {
            CatalogError::backend(format!("reading record {} of layer {}", index, id), e)
        })
    }
}
