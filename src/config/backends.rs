//! Typed per-backend configuration and the static default table.

use serde::Serialize;

use super::options::OptionBag;
use crate::backend::BackendKind;
use crate::error::{CatalogError, Result};

// =============================================================================
// Option Keys
// =============================================================================

pub const OPT_PATH: &str = "path";
pub const OPT_URI: &str = "uri";
pub const OPT_WEBHDFS_PORT: &str = "webhdfsPort";
pub const OPT_USER: &str = "user";
pub const OPT_BUCKET: &str = "bucket";
pub const OPT_PREFIX: &str = "prefix";
pub const OPT_REGION: &str = "region";
pub const OPT_ENDPOINT: &str = "endpoint";
pub const OPT_INSTANCE: &str = "instance";
pub const OPT_ZOOKEEPERS: &str = "zookeepers";
pub const OPT_PASSWORD: &str = "password";
pub const OPT_MASTER: &str = "master";
pub const OPT_ATTRIBUTE_TABLE: &str = "attributeTable";
pub const OPT_HOSTS: &str = "hosts";
pub const OPT_USERNAME: &str = "username";
pub const OPT_KEYSPACE: &str = "keyspace";
pub const OPT_REPLICATION_STRATEGY: &str = "replicationStrategy";
pub const OPT_REPLICATION_FACTOR: &str = "replicationFactor";
pub const OPT_LOCAL_DC: &str = "localDc";
pub const OPT_USED_HOSTS_PER_REMOTE_DC: &str = "usedHostsPerRemoteDc";
pub const OPT_ALLOW_REMOTE_DCS: &str = "allowRemoteDCsForLocalConsistencyLevel";

// =============================================================================
// Default Values
// =============================================================================

/// Default WebHDFS port of a Hadoop 3 namenode.
pub const DEFAULT_WEBHDFS_PORT: i64 = 9870;

/// Default user for WebHDFS requests.
pub const DEFAULT_HDFS_USER: &str = "hdfs";

/// Default key prefix inside an S3 bucket (the bucket root).
pub const DEFAULT_S3_PREFIX: &str = "";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default ZooKeeper quorum for Accumulo and HBase.
pub const DEFAULT_ZOOKEEPERS: &str = "localhost:2181";

/// Default Accumulo user.
pub const DEFAULT_ACCUMULO_USER: &str = "root";

/// Default password (none).
pub const DEFAULT_PASSWORD: &str = "";

/// Default attribute table of the Accumulo and HBase stores.
pub const DEFAULT_ATTRIBUTE_TABLE: &str = "metadata";

/// Default HBase master address (resolved through ZooKeeper when empty).
pub const DEFAULT_HBASE_MASTER: &str = "";

/// Default Cassandra contact point.
pub const DEFAULT_CASSANDRA_HOSTS: &str = "localhost";

/// Default Cassandra username (none).
pub const DEFAULT_CASSANDRA_USERNAME: &str = "";

/// Default Cassandra keyspace.
pub const DEFAULT_KEYSPACE: &str = "geotrellis";

/// Default Cassandra attribute table.
pub const DEFAULT_CASSANDRA_ATTRIBUTE_TABLE: &str = "attributes";

/// Default Cassandra replication strategy.
pub const DEFAULT_REPLICATION_STRATEGY: &str = "SimpleStrategy";

/// Default Cassandra replication factor.
pub const DEFAULT_REPLICATION_FACTOR: i64 = 1;

/// Default Cassandra local datacenter.
pub const DEFAULT_LOCAL_DC: &str = "datacenter1";

/// Default number of hosts used per remote datacenter.
pub const DEFAULT_USED_HOSTS_PER_REMOTE_DC: i64 = 0;

/// Default for allowing remote datacenters at local consistency levels.
pub const DEFAULT_ALLOW_REMOTE_DCS: bool = false;

/// Default of one recognized option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// No default; a blank or absent value is a configuration error
    Required,
    Str(&'static str),
    Int(i64),
    /// 0/1 flag
    Flag(bool),
}

/// One row of the default table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OptionSpec {
    pub key: &'static str,
    pub default: DefaultValue,
    pub description: &'static str,
}

const fn spec(key: &'static str, default: DefaultValue, description: &'static str) -> OptionSpec {
    OptionSpec {
        key,
        default,
        description,
    }
}

const FILE_OPTIONS: &[OptionSpec] = &[spec(
    OPT_PATH,
    DefaultValue::Required,
    "catalog root directory",
)];

const HADOOP_OPTIONS: &[OptionSpec] = &[
    spec(OPT_URI, DefaultValue::Required, "catalog URI, hdfs://namenode:port/path"),
    spec(
        OPT_WEBHDFS_PORT,
        DefaultValue::Int(DEFAULT_WEBHDFS_PORT),
        "namenode WebHDFS port",
    ),
    spec(OPT_USER, DefaultValue::Str(DEFAULT_HDFS_USER), "WebHDFS user.name"),
];

const S3_OPTIONS: &[OptionSpec] = &[
    spec(OPT_BUCKET, DefaultValue::Required, "catalog bucket"),
    spec(OPT_PREFIX, DefaultValue::Str(DEFAULT_S3_PREFIX), "catalog key prefix"),
    spec(OPT_REGION, DefaultValue::Str(DEFAULT_REGION), "AWS region"),
    spec(
        OPT_ENDPOINT,
        DefaultValue::Str(""),
        "custom endpoint for S3-compatible services",
    ),
];

const ACCUMULO_OPTIONS: &[OptionSpec] = &[
    spec(OPT_INSTANCE, DefaultValue::Required, "Accumulo instance name"),
    spec(OPT_ZOOKEEPERS, DefaultValue::Str(DEFAULT_ZOOKEEPERS), "ZooKeeper quorum"),
    spec(OPT_USER, DefaultValue::Str(DEFAULT_ACCUMULO_USER), "Accumulo user"),
    spec(OPT_PASSWORD, DefaultValue::Str(DEFAULT_PASSWORD), "Accumulo password"),
    spec(
        OPT_ATTRIBUTE_TABLE,
        DefaultValue::Str(DEFAULT_ATTRIBUTE_TABLE),
        "attribute table",
    ),
];

const HBASE_OPTIONS: &[OptionSpec] = &[
    spec(OPT_ZOOKEEPERS, DefaultValue::Str(DEFAULT_ZOOKEEPERS), "ZooKeeper quorum"),
    spec(OPT_MASTER, DefaultValue::Str(DEFAULT_HBASE_MASTER), "HBase master address"),
    spec(
        OPT_ATTRIBUTE_TABLE,
        DefaultValue::Str(DEFAULT_ATTRIBUTE_TABLE),
        "attribute table",
    ),
];

const CASSANDRA_OPTIONS: &[OptionSpec] = &[
    spec(
        OPT_HOSTS,
        DefaultValue::Str(DEFAULT_CASSANDRA_HOSTS),
        "comma-separated contact points",
    ),
    spec(OPT_USERNAME, DefaultValue::Str(DEFAULT_CASSANDRA_USERNAME), "auth username"),
    spec(OPT_PASSWORD, DefaultValue::Str(DEFAULT_PASSWORD), "auth password"),
    spec(OPT_KEYSPACE, DefaultValue::Str(DEFAULT_KEYSPACE), "catalog keyspace"),
    spec(
        OPT_ATTRIBUTE_TABLE,
        DefaultValue::Str(DEFAULT_CASSANDRA_ATTRIBUTE_TABLE),
        "attribute table",
    ),
    spec(
        OPT_REPLICATION_STRATEGY,
        DefaultValue::Str(DEFAULT_REPLICATION_STRATEGY),
        "keyspace replication strategy",
    ),
    spec(
        OPT_REPLICATION_FACTOR,
        DefaultValue::Int(DEFAULT_REPLICATION_FACTOR),
        "keyspace replication factor",
    ),
    spec(OPT_LOCAL_DC, DefaultValue::Str(DEFAULT_LOCAL_DC), "local datacenter"),
    spec(
        OPT_USED_HOSTS_PER_REMOTE_DC,
        DefaultValue::Int(DEFAULT_USED_HOSTS_PER_REMOTE_DC),
        "hosts used per remote datacenter",
    ),
    spec(
        OPT_ALLOW_REMOTE_DCS,
        DefaultValue::Flag(DEFAULT_ALLOW_REMOTE_DCS),
        "allow remote datacenters for local consistency levels (0/1)",
    ),
];

/// Recognized options of `kind` with their defaults.
pub fn options_for(kind: BackendKind) -> &'static [OptionSpec] {
    match kind {
        BackendKind::File => FILE_OPTIONS,
        BackendKind::Hadoop => HADOOP_OPTIONS,
        BackendKind::S3 => S3_OPTIONS,
        BackendKind::Accumulo => ACCUMULO_OPTIONS,
        BackendKind::HBase => HBASE_OPTIONS,
        BackendKind::Cassandra => CASSANDRA_OPTIONS,
    }
}

fn required(options: &OptionBag, kind: BackendKind, key: &str) -> Result<String> {
    options.string(key).ok_or_else(|| {
        CatalogError::config(format!("{} backend requires option '{}'", kind, key))
    })
}

// =============================================================================
// Per-backend Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileConfig {
    pub path: String,
}

impl FileConfig {
    pub fn resolve(options: &OptionBag) -> Result<Self> {
        Ok(Self {
            path: required(options, BackendKind::File, OPT_PATH)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HadoopConfig {
    pub uri: String,
    pub webhdfs_port: u16,
    pub user: String,
}

impl HadoopConfig {
    pub fn resolve(options: &OptionBag) -> Result<Self> {
        let port = options.int_or(OPT_WEBHDFS_PORT, DEFAULT_WEBHDFS_PORT);
        let webhdfs_port = u16::try_from(port).map_err(|_| {
            CatalogError::config(format!("{} {} is not a valid port", OPT_WEBHDFS_PORT, port))
        })?;
        Ok(Self {
            uri: required(options, BackendKind::Hadoop, OPT_URI)?,
            webhdfs_port,
            user: options.string_or(OPT_USER, DEFAULT_HDFS_USER),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct S3Config {
    pub bucket: String,
    pub prefix: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl S3Config {
    pub fn resolve(options: &OptionBag) -> Result<Self> {
        Ok(Self {
            bucket: required(options, BackendKind::S3, OPT_BUCKET)?,
            prefix: options
                .string_or(OPT_PREFIX, DEFAULT_S3_PREFIX)
                .trim_matches('/')
                .to_string(),
            region: options.string_or(OPT_REGION, DEFAULT_REGION),
            endpoint: options.string(OPT_ENDPOINT),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccumuloConfig {
    pub instance: String,
    pub zookeepers: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub attribute_table: String,
}

impl AccumuloConfig {
    pub fn resolve(options: &OptionBag) -> Result<Self> {
        Ok(Self {
            instance: required(options, BackendKind::Accumulo, OPT_INSTANCE)?,
            zookeepers: options.string_or(OPT_ZOOKEEPERS, DEFAULT_ZOOKEEPERS),
            user: options.string_or(OPT_USER, DEFAULT_ACCUMULO_USER),
            password: options.string_or(OPT_PASSWORD, DEFAULT_PASSWORD),
            attribute_table: options.string_or(OPT_ATTRIBUTE_TABLE, DEFAULT_ATTRIBUTE_TABLE),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HBaseConfig {
    pub zookeepers: String,
    pub master: Option<String>,
    pub attribute_table: String,
}

impl HBaseConfig {
    pub fn resolve(options: &OptionBag) -> Result<Self> {
        Ok(Self {
            zookeepers: options.string_or(OPT_ZOOKEEPERS, DEFAULT_ZOOKEEPERS),
            master: options.string(OPT_MASTER),
            attribute_table: options.string_or(OPT_ATTRIBUTE_TABLE, DEFAULT_ATTRIBUTE_TABLE),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CassandraConfig {
    pub hosts: Vec<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub keyspace: String,
    pub attribute_table: String,
    pub replication_strategy: String,
    pub replication_factor: u32,
    pub local_dc: String,
    pub used_hosts_per_remote_dc: u32,
    pub allow_remote_dcs_for_local_consistency_level: bool,
}

impl CassandraConfig {
    pub fn resolve(options: &OptionBag) -> Result<Self> {
        let hosts: Vec<String> = options
            .string_or(OPT_HOSTS, DEFAULT_CASSANDRA_HOSTS)
            .split(',')
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if hosts.is_empty() {
            return Err(CatalogError::config("cassandra backend needs at least one host"));
        }

        let replication_factor = non_negative(
            options,
            OPT_REPLICATION_FACTOR,
            DEFAULT_REPLICATION_FACTOR,
        )?;
        if replication_factor == 0 {
            return Err(CatalogError::config(format!(
                "{} must be at least 1",
                OPT_REPLICATION_FACTOR
            )));
        }

        Ok(Self {
            hosts,
            username: options.string(OPT_USERNAME),
            password: options.string(OPT_PASSWORD),
            keyspace: options.string_or(OPT_KEYSPACE, DEFAULT_KEYSPACE),
            attribute_table: options
                .string_or(OPT_ATTRIBUTE_TABLE, DEFAULT_CASSANDRA_ATTRIBUTE_TABLE),
            replication_strategy: options
                .string_or(OPT_REPLICATION_STRATEGY, DEFAULT_REPLICATION_STRATEGY),
            replication_factor,
            local_dc: options.string_or(OPT_LOCAL_DC, DEFAULT_LOCAL_DC),
            used_hosts_per_remote_dc: non_negative(
                options,
                OPT_USED_HOSTS_PER_REMOTE_DC,
                DEFAULT_USED_HOSTS_PER_REMOTE_DC,
            )?,
            allow_remote_dcs_for_local_consistency_level: options
                .flag_or(OPT_ALLOW_REMOTE_DCS, DEFAULT_ALLOW_REMOTE_DCS),
        })
    }
}

fn non_negative(options: &OptionBag, key: &str, default: i64) -> Result<u32> {
    let value = options.int_or(key, default);
    u32::try_from(value)
        .map_err(|_| CatalogError::config(format!("{} must be a non-negative integer, got {}", key, value)))
}

/// Resolved configuration of any backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    File(FileConfig),
    #[serde(rename = "hdfs")]
    Hadoop(HadoopConfig),
    S3(S3Config),
    Accumulo(AccumuloConfig),
    HBase(HBaseConfig),
    Cassandra(CassandraConfig),
}

impl BackendConfig {
    /// Resolve an option bag for `kind`, failing fast on missing required options.
    pub fn resolve(kind: BackendKind, options: &OptionBag) -> Result<Self> {
        Ok(match kind {
            BackendKind::File => BackendConfig::File(FileConfig::resolve(options)?),
            BackendKind::Hadoop => BackendConfig::Hadoop(HadoopConfig::resolve(options)?),
            BackendKind::S3 => BackendConfig::S3(S3Config::resolve(options)?),
            BackendKind::Accumulo => BackendConfig::Accumulo(AccumuloConfig::resolve(options)?),
            BackendKind::HBase => BackendConfig::HBase(HBaseConfig::resolve(options)?),
            BackendKind::Cassandra => BackendConfig::Cassandra(CassandraConfig::resolve(options)?),
        })
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::File(_) => BackendKind::File,
            BackendConfig::Hadoop(_) => BackendKind::Hadoop,
            BackendConfig::S3(_) => BackendKind::S3,
            BackendConfig::Accumulo(_) => BackendKind::Accumulo,
            BackendConfig::HBase(_) => BackendKind::HBase,
            BackendConfig::Cassandra(_) => BackendKind::Cassandra,
        }
    }
}
