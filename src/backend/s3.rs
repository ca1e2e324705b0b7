//! S3 catalog.
//!
//! ```text
//! s3://<bucket>/<prefix>/_attributes/<attribute>__<name>__<zoom>.json
//! s3://<header bucket>/<header key>/<key index>
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use super::{BackendHandle, BackendKind};
use crate::catalog::{decode_attribute, AttributeStore, ValueReader, HEADER_ATTRIBUTE};
use crate::error::{BackendError, CatalogError, Result};
use crate::layer::{HeaderLocation, LayerHeader, LayerId};

const ATTRIBUTE_DIR: &str = "_attributes";

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services generally need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}

/// Map an SDK failure to a backend error, recognising missing objects.
fn map_sdk_error<E, R>(err: SdkError<E, R>, location: &str) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code_not_found = err
        .as_service_error()
        .and_then(|se| se.code())
        .map(|code| code == "NoSuchKey" || code == "NotFound")
        .unwrap_or(false);
    if code_not_found {
        return BackendError::NotFound(location.to_string());
    }

    let err_str = err.to_string();
    if err_str.contains("NoSuchKey") || err_str.contains("NotFound") || err_str.contains("404") {
        return BackendError::NotFound(location.to_string());
    }

    BackendError::S3(format!("{}: {}", location, err_str))
}

async fn get_object(client: &Client, bucket: &str, key: &str) -> Result<Bytes, BackendError> {
    let location = format!("s3://{}/{}", bucket, key);
    let resp = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, &location))?;

    let data = resp
        .body
        .collect()
        .await
        .map_err(|e| BackendError::S3(format!("{}: {}", location, e)))?
        .into_bytes();
    Ok(data)
}

fn join_key(prefix: &str, child: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", prefix, child)
    }
}

fn attribute_key(prefix: &str, id: &LayerId, attribute: &str) -> String {
    join_key(
        prefix,
        &format!("{}/{}__{}__{}.json", ATTRIBUTE_DIR, attribute, id.name, id.zoom),
    )
}

fn parse_header_key(key: &str) -> Option<LayerId> {
    let file_name = key.rsplit('/').next()?;
    let stem = file_name
        .strip_prefix(HEADER_ATTRIBUTE)?
        .strip_prefix("__")?
        .strip_suffix(".json")?;
    let (name, zoom) = stem.rsplit_once("__")?;
    Some(LayerId::new(name, zoom.parse().ok()?))
}

#[derive(Clone)]
pub struct S3AttributeStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3AttributeStore {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl AttributeStore for S3AttributeStore {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    fn handle(&self) -> BackendHandle {
        BackendHandle::S3 {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
        }
    }

    async fn read_attribute(&self, id: &LayerId, name: &str) -> Result<Value> {
        let key = attribute_key(&self.prefix, id, name);
        let bytes = get_object(&self.client, &self.bucket, &key)
            .await
            .map_err(|e| CatalogError::backend(format!("reading {} of layer {}", name, id), e))?;
        decode_attribute(&bytes, id, name)
    }

    async fn layer_ids(&self) -> Result<Vec<LayerId>> {
        let list_prefix = join_key(&self.prefix, &format!("{}/{}__", ATTRIBUTE_DIR, HEADER_ATTRIBUTE));
        let location = format!("s3://{}/{}", self.bucket, list_prefix);
        let mut ids = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let result = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&list_prefix)
                .max_keys(1000)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| {
                    CatalogError::backend("listing layers", map_sdk_error(e, &location))
                })?;

            ids.extend(
                result
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .filter_map(parse_header_key),
            );

            match result.next_continuation_token() {
                Some(token) if result.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        ids.sort();
        Ok(ids)
    }
}

pub struct S3ValueReader {
    store: Arc<dyn AttributeStore>,
    client: Client,
}

impl S3ValueReader {
    pub fn new(store: Arc<dyn AttributeStore>, client: Client) -> Self {
        Self { store, client }
    }
}

#[async_trait]
impl ValueReader for S3ValueReader {
    fn attribute_store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    async fn fetch_record(&self, id: &LayerId, header: &LayerHeader, index: u64) -> Result<Bytes> {
        let HeaderLocation::S3 { bucket, key } = &header.location else {
            return Err(CatalogError::InvalidAttribute {
                layer: id.clone(),
                attribute: HEADER_ATTRIBUTE.to_string(),
                reason: "not an s3 layer header".to_string(),
            });
        };
        let record = join_key(key, &index.to_string());
        debug!(bucket = %bucket, key = %record, "Reading S3 record");
        get_object(&self.client, bucket, &record).await.map_err(|e| {
            CatalogError::backend(format!("reading record {} of layer {}", index, id), e)
        })
    }
}
