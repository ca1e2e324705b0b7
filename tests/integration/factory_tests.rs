//! Backend factory integration tests.
//!
//! Tests verify:
//! - Option defaults and the lenient 0/1 flag policy reach the connector
//! - Missing required options fail before any connection is attempted
//! - A value reader built from an existing store reads through its connection

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use raster_catalog::backend::{ClusterClient, ClusterConnector, ClusterTarget, InMemoryCluster};
use raster_catalog::config::{options_for, CassandraConfig, DefaultValue};
use raster_catalog::error::BackendError;
use raster_catalog::layer::HeaderLocation;
use raster_catalog::{BackendConfig, BackendFactory, BackendKind, LayerId, OptionBag, TileRequest};

use super::test_utils::{elevation_layer, sample_band, write_cluster_layer, write_file_layer};

/// Connector that remembers the Cassandra configurations it was handed.
#[derive(Default)]
struct RecordingConnector {
    cluster: InMemoryCluster,
    cassandra: Mutex<Vec<CassandraConfig>>,
}

impl RecordingConnector {
    fn last_cassandra(&self) -> CassandraConfig {
        self.cassandra.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ClusterConnector for RecordingConnector {
    async fn connect(&self, target: ClusterTarget<'_>) -> Result<Arc<dyn ClusterClient>, BackendError> {
        if let ClusterTarget::Cassandra(config) = target {
            self.cassandra.lock().unwrap().push(config.clone());
        }
        Ok(Arc::new(self.cluster.clone()))
    }
}

// =============================================================================
// Option Resolution
// =============================================================================

#[tokio::test]
async fn test_cassandra_defaults_reach_connector() {
    let connector = Arc::new(RecordingConnector::default());
    let options = OptionBag::new()
        .with("hosts", "cassandra-1, cassandra-2")
        .with("keyspace", "catalog");

    let backend = BackendFactory::new()
        .with_cluster_connector(connector.clone())
        .build(BackendKind::Cassandra, &options)
        .await
        .unwrap();
    assert_eq!(backend.kind(), BackendKind::Cassandra);

    let config = connector.last_cassandra();
    assert_eq!(config.local_dc, "datacenter1");
    assert_eq!(config.hosts, vec!["cassandra-1", "cassandra-2"]);
    assert_eq!(config.keyspace, "catalog");
    assert_eq!(config.attribute_table, "attributes");
    assert_eq!(config.replication_strategy, "SimpleStrategy");
    assert_eq!(config.replication_factor, 1);
    assert_eq!(config.used_hosts_per_remote_dc, 0);
    assert!(!config.allow_remote_dcs_for_local_consistency_level);
}

#[tokio::test]
async fn test_out_of_range_flag_takes_default() {
    let connector = Arc::new(RecordingConnector::default());
    let factory = BackendFactory::new().with_cluster_connector(connector.clone());

    let flagged = |value: i64| {
        OptionBag::new().with("allowRemoteDCsForLocalConsistencyLevel", value)
    };

    factory.build(BackendKind::Cassandra, &flagged(2)).await.unwrap();
    assert!(!connector.last_cassandra().allow_remote_dcs_for_local_consistency_level);

    factory.build(BackendKind::Cassandra, &flagged(1)).await.unwrap();
    assert!(connector.last_cassandra().allow_remote_dcs_for_local_consistency_level);

    factory.build(BackendKind::Cassandra, &flagged(-1)).await.unwrap();
    assert!(!connector.last_cassandra().allow_remote_dcs_for_local_consistency_level);

    // String values are decoded the same way
    let options = OptionBag::new().with("allowRemoteDCsForLocalConsistencyLevel", "1");
    factory.build(BackendKind::Cassandra, &options).await.unwrap();
    assert!(connector.last_cassandra().allow_remote_dcs_for_local_consistency_level);
}

#[test]
fn test_lenient_values_fall_back() {
    let options = OptionBag::new()
        .with("localDc", "  ")
        .with("replicationFactor", "three")
        .with("usedHostsPerRemoteDc", 2)
        .with("someFutureOption", "whatever");
    let BackendConfig::Cassandra(config) =
        BackendConfig::resolve(BackendKind::Cassandra, &options).unwrap()
    else {
        panic!("expected a cassandra config");
    };
    assert_eq!(config.local_dc, "datacenter1");
    assert_eq!(config.replication_factor, 1);
    assert_eq!(config.used_hosts_per_remote_dc, 2);
}

#[test]
fn test_default_table_matches_resolution() {
    let local_dc = options_for(BackendKind::Cassandra)
        .iter()
        .find(|o| o.key == "localDc")
        .unwrap();
    assert_eq!(local_dc.default, DefaultValue::Str("datacenter1"));

    let path = options_for(BackendKind::File)
        .iter()
        .find(|o| o.key == "path")
        .unwrap();
    assert_eq!(path.default, DefaultValue::Required);

    for kind in BackendKind::ALL {
        assert!(!options_for(kind).is_empty(), "{} has no options", kind);
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

#[tokio::test]
async fn test_missing_required_option() {
    let factory = BackendFactory::new().with_cluster_connector(Arc::new(InMemoryCluster::new()));
    let cases = [
        (BackendKind::File, "path"),
        (BackendKind::Hadoop, "uri"),
        (BackendKind::S3, "bucket"),
        (BackendKind::Accumulo, "instance"),
    ];
    for (kind, key) in cases {
        let err = match factory.build(kind, &OptionBag::new()).await {
            Ok(_) => panic!("{} built without {}", kind, key),
            Err(e) => e,
        };
        assert!(err.is_config(), "{}: unexpected error: {}", kind, err);
        assert!(err.to_string().contains(key), "{}: {}", kind, err);
    }

    // Blank counts as missing
    let options = OptionBag::new().with("bucket", "   ");
    let err = factory.build(BackendKind::S3, &options).await.err().unwrap();
    assert!(err.is_config());
}

#[tokio::test]
async fn test_cluster_backend_without_connector() {
    let options = OptionBag::new().with("instance", "gis");
    let err = BackendFactory::new()
        .build(BackendKind::Accumulo, &options)
        .await
        .err()
        .unwrap();
    assert!(err.is_config(), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_invalid_hdfs_uri() {
    let options = OptionBag::new().with("uri", "s3://bucket/catalog");
    let err = BackendFactory::new()
        .build(BackendKind::Hadoop, &options)
        .await
        .err()
        .unwrap();
    assert!(err.is_config(), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_unknown_options_are_ignored() {
    let dir = TempDir::new().unwrap();
    let options = OptionBag::new()
        .with("path", dir.path().to_string_lossy().to_string())
        .with("colour", "blue")
        .with("retries", 5);
    let backend = BackendFactory::new()
        .build(BackendKind::File, &options)
        .await
        .unwrap();
    assert!(backend.attribute_store.layer_ids().await.unwrap().is_empty());
}

// =============================================================================
// Readers From Existing Stores
// =============================================================================

#[tokio::test]
async fn test_value_reader_for_file_store() {
    let dir = TempDir::new().unwrap();
    let location = HeaderLocation::File {
        path: "elevation/10".to_string(),
    };
    write_file_layer(dir.path(), &elevation_layer(location)).await;

    let options = OptionBag::new().with("path", dir.path().to_string_lossy().to_string());
    let backend = BackendFactory::new()
        .build(BackendKind::File, &options)
        .await
        .unwrap();

    let reader = BackendFactory::value_reader_for(backend.attribute_store.clone());
    assert!(Arc::ptr_eq(reader.attribute_store(), &backend.attribute_store));

    let request = TileRequest::spatial("elevation", 10, 5, 7);
    let from_store = reader.read_tile(&request).await.unwrap();
    let from_factory = backend.value_reader.read_tile(&request).await.unwrap();
    assert_eq!(from_store, from_factory);
}

#[tokio::test]
async fn test_value_reader_for_cluster_store() {
    let cluster = InMemoryCluster::new();
    let location = HeaderLocation::Accumulo {
        tile_table: "tiles".to_string(),
    };
    write_cluster_layer(&cluster, BackendKind::Accumulo, "metadata", &elevation_layer(location));

    let options = OptionBag::new().with("instance", "gis");
    let backend = BackendFactory::new()
        .with_cluster_connector(Arc::new(cluster.clone()))
        .build(BackendKind::Accumulo, &options)
        .await
        .unwrap();

    let reader = BackendFactory::value_reader_for(backend.attribute_store.clone());
    assert_eq!(reader.attribute_store().kind(), BackendKind::Accumulo);
    assert_eq!(
        reader.attribute_store().handle().kind(),
        BackendKind::Accumulo
    );

    let tile = reader
        .read_multiband(&TileRequest::spatial("elevation", 10, 6, 7))
        .await
        .unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 67)]);

    let err = reader
        .read_tile(&TileRequest::spatial("elevation", 9, 6, 7))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!reader
        .attribute_store()
        .layer_exists(&LayerId::new("elevation", 9))
        .await
        .unwrap());
}
