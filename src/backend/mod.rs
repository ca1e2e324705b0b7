//! Storage backends.
//!
//! Each backend provides an [`AttributeStore`](crate::catalog::AttributeStore)
//! over its catalog and a [`ValueReader`](crate::catalog::ValueReader) that fetches tile records from the same connection:
//!
//! | kind      | attribute store          | value reader           |
//! |-----------|--------------------------|------------------------|
//! | file      | [`FileAttributeStore`]   | [`FileValueReader`]    |
//! | hdfs      | [`HadoopAttributeStore`] | [`HadoopValueReader`]  |
//! | s3        | [`S3AttributeStore`]     | [`S3ValueReader`]      |
//! | accumulo  | [`AccumuloAttributeStore`] | [`AccumuloValueReader`] |
//! | hbase     | [`HBaseAttributeStore`]  | [`HBaseValueReader`]   |
//! | cassandra | [`CassandraAttributeStore`] | [`CassandraValueReader`] |
//!
//! The cluster stores talk to their databases through the [`ClusterClient`]
//! seam; [`BackendFactory`] wires everything together from an option bag.

mod accumulo;
mod cassandra;
mod cluster;
mod factory;
mod file;
mod hadoop;
mod hbase;
mod s3;

pub use accumulo::{AccumuloAttributeStore, AccumuloValueReader};
pub use cassandra::{qualified_table, CassandraAttributeStore, CassandraValueReader};
pub use cluster::{
    index_row, layer_row, parse_layer_row, ClusterClient, ClusterConnector, ClusterTarget,
    InMemoryCluster,
};
pub use factory::{Backend, BackendFactory};
pub use file::{attribute_file_name, FileAttributeStore, FileValueReader};
pub use hadoop::{catalog_root, HadoopAttributeStore, HadoopFs, HadoopValueReader, WebHdfsClient};
pub use hbase::{tile_row, HBaseAttributeStore, HBaseValueReader};
pub use s3::{create_s3_client, S3AttributeStore, S3ValueReader};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The six supported storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    #[serde(rename = "hdfs")]
    Hadoop,
    S3,
    Accumulo,
    HBase,
    Cassandra,
}

impl BackendKind {
    pub const ALL: [BackendKind; 6] = [
        BackendKind::File,
        BackendKind::Hadoop,
        BackendKind::S3,
        BackendKind::Accumulo,
        BackendKind::HBase,
        BackendKind::Cassandra,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::Hadoop => "hdfs",
            BackendKind::S3 => "s3",
            BackendKind::Accumulo => "accumulo",
            BackendKind::HBase => "hbase",
            BackendKind::Cassandra => "cassandra",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "hdfs" | "hadoop" => Ok(BackendKind::Hadoop),
            "s3" => Ok(BackendKind::S3),
            "accumulo" => Ok(BackendKind::Accumulo),
            "hbase" => Ok(BackendKind::HBase),
            "cassandra" => Ok(BackendKind::Cassandra),
            other => Err(format!(
                "unknown backend '{}', expected one of file, hdfs, s3, accumulo, hbase, cassandra",
                other
            )),
        }
    }
}

/// Connection state an attribute store exposes so a value reader can be
/// built on the same connection.
///
/// Cloning is cheap: every variant holds shared clients.
#[derive(Clone)]
pub enum BackendHandle {
    File {
        root: PathBuf,
    },
    Hadoop {
        fs: Arc<dyn HadoopFs>,
        root: String,
    },
    S3 {
        client: aws_sdk_s3::Client,
        bucket: String,
        prefix: String,
    },
    Accumulo {
        client: Arc<dyn ClusterClient>,
        attribute_table: String,
    },
    HBase {
        client: Arc<dyn ClusterClient>,
        attribute_table: String,
    },
    Cassandra {
        client: Arc<dyn ClusterClient>,
        keyspace: String,
        attribute_table: String,
    },
}

impl BackendHandle {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendHandle::File { .. } => BackendKind::File,
            BackendHandle::Hadoop { .. } => BackendKind::Hadoop,
            BackendHandle::S3 { .. } => BackendKind::S3,
            BackendHandle::Accumulo { .. } => BackendKind::Accumulo,
            BackendHandle::HBase { .. } => BackendKind::HBase,
            BackendHandle::Cassandra { .. } => BackendKind::Cassandra,
        }
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendHandle::File { root } => f.debug_struct("File").field("root", root).finish(),
            BackendHandle::Hadoop { root, .. } => {
                f.debug_struct("Hadoop").field("root", root).finish_non_exhaustive()
            }
            BackendHandle::S3 { bucket, prefix, .. } => f
                .debug_struct("S3")
                .field("bucket", bucket)
                .field("prefix", prefix)
                .finish_non_exhaustive(),
            BackendHandle::Accumulo {
                attribute_table, ..
            } => f
                .debug_struct("Accumulo")
                .field("attribute_table", attribute_table)
                .finish_non_exhaustive(),
            BackendHandle::HBase {
                attribute_table, ..
            } => f
                .debug_struct("HBase")
                .field("attribute_table", attribute_table)
                .finish_non_exhaustive(),
            BackendHandle::Cassandra {
                keyspace,
                attribute_table,
                ..
            } => f
                .debug_struct("Cassandra")
                .field("keyspace", keyspace)
                .field("attribute_table", attribute_table)
                .finish_non_exhaustive(),
        }
    }
}
