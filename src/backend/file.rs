//! Local filesystem catalog.
//!
//! ```text
//! <root>/attributes/<name>__.__<zoom>__.__<attribute>.json
//! <header path>/<key index>
//! ```
//!
//! A relative header path is resolved against the catalog root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use super::{BackendHandle, BackendKind};
use crate::catalog::{decode_attribute, AttributeStore, ValueReader, HEADER_ATTRIBUTE};
use crate::error::{BackendError, CatalogError, Result};
use crate::layer::{HeaderLocation, LayerHeader, LayerId};

const ATTRIBUTE_DIR: &str = "attributes";
const SEPARATOR: &str = "__.__";

/// Attribute file name for `attribute` of `id`.
pub fn attribute_file_name(id: &LayerId, attribute: &str) -> String {
    format!("{}{sep}{}{sep}{}.json", id.name, id.zoom, attribute, sep = SEPARATOR)
}

fn parse_header_file_name(file_name: &str) -> Option<LayerId> {
    let stem = file_name.strip_suffix(&format!("{}{}.json", SEPARATOR, HEADER_ATTRIBUTE))?;
    let (name, zoom) = stem.rsplit_once(SEPARATOR)?;
    Some(LayerId::new(name, zoom.parse().ok()?))
}

#[derive(Debug, Clone)]
pub struct FileAttributeStore {
    root: PathBuf,
}

impl FileAttributeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn attribute_dir(&self) -> PathBuf {
        self.root.join(ATTRIBUTE_DIR)
    }

    pub fn attribute_path(&self, id: &LayerId, attribute: &str) -> PathBuf {
        self.attribute_dir().join(attribute_file_name(id, attribute))
    }
}

#[async_trait]
impl AttributeStore for FileAttributeStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn handle(&self) -> BackendHandle {
        BackendHandle::File {
            root: self.root.clone(),
        }
    }

    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value> {
        let path = self.attribute_path(id, name);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            CatalogError::backend(
                format!("reading {} of layer {} from {}", name, id, path.display()),
                BackendError::from(e),
            )
        })?;
        decode_attribute(&bytes, id, name)
    }

    async fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let dir = self.attribute_dir();
        let context = || format!("listing layers in {}", dir.display());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // an empty catalog has no attribute directory yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CatalogError::backend(context(), e.into())),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CatalogError::backend(context(), e.into()))?
        {
            if let Some(id) = entry.file_name().to_str().and_then(parse_header_file_name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

pub struct FileValueReader {
    store: Arc<dyn AttributeStore>,
    root: PathBuf,
}

impl FileValueReader {
    pub fn new(store: Arc<dyn AttributeStore>, root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    fn layer_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl ValueReader for FileValueReader {
    fn attribute_store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes> {
        let HeaderLocation::File { path } = &header.location else {
            return Err(CatalogError::InvalidAttribute {
                layer: id.clone(),
                attribute: HEADER_ATTRIBUTE.to_string(),
                reason: "not a file layer header".to_string(),
            });
        };
        let record = self.layer_path(path).join(index.to_string());
        debug!(path = %record.display(), "Reading file record");
        let bytes = tokio::fs::read(&record).await.map_err(|e| {
            CatalogError::backend(
                format!("reading record {} of layer {}", index, id),
                BackendError::from(e),
            )
        })?;
        Ok(Bytes::from(bytes))
    }
}
