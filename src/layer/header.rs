use serde::{Deserialize, Serialize};

use super::{KeyKind, ValueKind};
use crate::backend::BackendKind;

/// Physical layout descriptor of a stored layer.
///
/// Serialized flat, with a `format` discriminator naming the backend:
///
/// ```json
/// {"format":"file","keyClass":"SpatialKey","valueClass":"Tile","path":"/data/catalog/elevation/10"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerHeader {
    #[serde(rename = "keyClass")]
    pub key_class: KeyKind,

    #[serde(rename = "valueClass")]
    pub value_class: ValueKind,

    #[serde(flatten)]
    pub location: HeaderLocation,
}

/// Backend-specific locator fields of a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum HeaderLocation {
    File {
        path: String,
    },
    Hdfs {
        path: String,
    },
    S3 {
        bucket: String,
        key: String,
    },
    Accumulo {
        #[serde(rename = "tileTable")]
        tile_table: String,
    },
    #[serde(rename = "hbase")]
    HBase {
        #[serde(rename = "tileTable")]
        tile_table: String,
    },
    Cassandra {
        keyspace: String,
        #[serde(rename = "tileTable")]
        tile_table: String,
    },
}

impl HeaderLocation {
    pub fn backend_kind(&self) -> BackendKind {
        match self {
            HeaderLocation::File { .. } => BackendKind::File,
            HeaderLocation::Hdfs { .. } => BackendKind::Hadoop,
            HeaderLocation::S3 { .. } => BackendKind::S3,
            HeaderLocation::Accumulo { .. } => BackendKind::Accumulo,
            HeaderLocation::HBase { .. } => BackendKind::HBase,
            HeaderLocation::Cassandra { .. } => BackendKind::Cassandra,
        }
    }
}

impl LayerHeader {
    pub fn new(key_class: KeyKind, value_class: ValueKind, location: HeaderLocation) -> Self {
        Self {
            key_class,
            value_class,
            location,
        }
    }

    /// Ordered field list: key class, value class, then the locator fields.
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![self.key_class.to_string(), self.value_class.to_string()];
        match &self.location {
            HeaderLocation::File { path } | HeaderLocation::Hdfs { path } => {
                fields.push(path.clone());
            }
            HeaderLocation::S3 { bucket, key } => {
                fields.push(bucket.clone());
                fields.push(key.clone());
            }
            HeaderLocation::Accumulo { tile_table } | HeaderLocation::HBase { tile_table } => {
                fields.push(tile_table.clone());
            }
            HeaderLocation::Cassandra {
                keyspace,
                tile_table,
            } => {
                fields.push(keyspace.clone());
                fields.push(tile_table.clone());
            }
        }
        fields
    }
}
