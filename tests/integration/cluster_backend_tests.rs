//! Accumulo, HBase and Cassandra integration tests.
//!
//! Each store runs on an [`InMemoryCluster`] seeded with the store's own
//! table layout, and is built through the factory the way a caller would.

use std::sync::Arc;

use raster_catalog::backend::InMemoryCluster;
use raster_catalog::codec::decode_tile;
use raster_catalog::layer::HeaderLocation;
use raster_catalog::{
    Backend, BackendFactory, BackendKind, KeyKind, LayerId, OptionBag, SpaceTimeKey,
    SpatialKey, TileRequest,
};

use super::test_utils::{
    elevation_layer, sample_band, sample_multiband, spatial_layer, temporal_layer,
    write_cluster_layer,
};

async fn cluster_backend(cluster: &InMemoryCluster, kind: BackendKind, options: OptionBag) -> Backend {
    BackendFactory::new()
        .with_cluster_connector(Arc::new(cluster.clone()))
        .build(kind, &options)
        .await
        .unwrap()
}

fn accumulo_options() -> OptionBag {
    OptionBag::new()
        .with("instance", "gis")
        .with("zookeepers", "zk1:2181")
        .with("user", "root")
        .with("password", "secret")
}

fn cassandra_location() -> HeaderLocation {
    HeaderLocation::Cassandra {
        keyspace: "geotrellis".to_string(),
        tile_table: "tiles".to_string(),
    }
}

/// Seed the elevation layer for `kind` and read tile (5, 7) back.
async fn assert_elevation_roundtrip(kind: BackendKind, location: HeaderLocation, options: OptionBag) {
    let attribute_table = match kind {
        BackendKind::Cassandra => "attributes",
        _ => "metadata",
    };
    let cluster = InMemoryCluster::new();
    write_cluster_layer(&cluster, kind, attribute_table, &elevation_layer(location));
    let backend = cluster_backend(&cluster, kind, options).await;
    assert_eq!(backend.kind(), kind);

    let id = LayerId::new("elevation", 10);
    let header = backend.attribute_store.read_header(&id).await.unwrap();
    assert_eq!(header.key_class, KeyKind::Spatial);

    let encoded = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 5, 7))
        .await
        .unwrap();
    let tile = decode_tile(&encoded).unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 57)]);

    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 99999, 99999))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{}: unexpected error: {}", kind, err);

    let err = backend
        .value_reader
        .read_tile(&TileRequest::temporal("elevation", 10, 5, 7, "2020-01-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch(), "{}: unexpected error: {}", kind, err);

    assert_eq!(backend.attribute_store.layer_ids().await.unwrap(), vec![id]);
}

#[tokio::test]
async fn test_accumulo_reads() {
    assert_elevation_roundtrip(
        BackendKind::Accumulo,
        HeaderLocation::Accumulo {
            tile_table: "tiles".to_string(),
        },
        accumulo_options(),
    )
    .await;
}

#[tokio::test]
async fn test_hbase_reads() {
    assert_elevation_roundtrip(
        BackendKind::HBase,
        HeaderLocation::HBase {
            tile_table: "tiles".to_string(),
        },
        OptionBag::new().with("zookeepers", "zk1:2181"),
    )
    .await;
}

#[tokio::test]
async fn test_cassandra_reads() {
    assert_elevation_roundtrip(
        BackendKind::Cassandra,
        cassandra_location(),
        OptionBag::new().with("hosts", "cassandra-1"),
    )
    .await;
}

#[tokio::test]
async fn test_custom_attribute_table() {
    let cluster = InMemoryCluster::new();
    let location = HeaderLocation::Accumulo {
        tile_table: "tiles".to_string(),
    };
    write_cluster_layer(&cluster, BackendKind::Accumulo, "catalog_attrs", &elevation_layer(location));

    // The default table holds nothing for this layer
    let backend = cluster_backend(
        &cluster,
        BackendKind::Accumulo,
        accumulo_options().with("attributeTable", "catalog_attrs"),
    )
    .await;
    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::spatial("elevation", 10, 0, 0))
        .await
        .unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 0)]);
}

#[tokio::test]
async fn test_layers_share_tile_table() {
    let cluster = InMemoryCluster::new();
    let location = HeaderLocation::HBase {
        tile_table: "tiles".to_string(),
    };
    write_cluster_layer(&cluster, BackendKind::HBase, "metadata", &elevation_layer(location.clone()));
    let landsat = spatial_layer(
        LayerId::new("landsat", 10),
        location,
        "uint8raw",
        vec![(SpatialKey::new(5, 7), sample_multiband(4, 4, 200))],
    );
    write_cluster_layer(&cluster, BackendKind::HBase, "metadata", &landsat);
    let backend = cluster_backend(&cluster, BackendKind::HBase, OptionBag::new()).await;

    // Same key index, different layer rows
    let elevation = backend
        .value_reader
        .read_multiband(&TileRequest::spatial("elevation", 10, 5, 7))
        .await
        .unwrap();
    let landsat = backend
        .value_reader
        .read_multiband(&TileRequest::spatial("landsat", 10, 5, 7))
        .await
        .unwrap();
    assert_eq!(elevation.band_count(), 1);
    assert_eq!(landsat, sample_multiband(4, 4, 200));

    assert_eq!(
        backend.attribute_store.layer_ids().await.unwrap(),
        vec![LayerId::new("elevation", 10), LayerId::new("landsat", 10)]
    );
}

#[tokio::test]
async fn test_cassandra_temporal_layer() {
    let cluster = InMemoryCluster::new();
    let instant = "2019-07-15T12:00:00Z";
    let fixture = temporal_layer(
        LayerId::new("ndvi", 4),
        cassandra_location(),
        "uint8raw",
        vec![
            (SpaceTimeKey::at(1, 2, instant).unwrap(), sample_band(4, 4, 11)),
            (SpaceTimeKey::at(2, 2, instant).unwrap(), sample_band(4, 4, 22)),
        ],
    );
    write_cluster_layer(&cluster, BackendKind::Cassandra, "attributes", &fixture);
    let backend = cluster_backend(&cluster, BackendKind::Cassandra, OptionBag::new()).await;

    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::temporal("ndvi", 4, 2, 2, instant))
        .await
        .unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 22)]);

    let metadata = backend
        .attribute_store
        .read_metadata(&LayerId::new("ndvi", 4), KeyKind::Temporal)
        .await
        .unwrap();
    assert_eq!(metadata.kind(), KeyKind::Temporal);

    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("ndvi", 4, 2, 2))
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[tokio::test]
async fn test_header_from_other_backend_is_rejected() {
    let cluster = InMemoryCluster::new();
    // An HBase header stored in an Accumulo attribute table
    let location = HeaderLocation::HBase {
        tile_table: "tiles".to_string(),
    };
    write_cluster_layer(&cluster, BackendKind::Accumulo, "metadata", &elevation_layer(location));
    let backend = cluster_backend(&cluster, BackendKind::Accumulo, accumulo_options()).await;

    let err = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 10))
        .await
        .unwrap_err();
    assert!(!err.is_not_found() && !err.is_type_mismatch(), "unexpected error: {}", err);
}
