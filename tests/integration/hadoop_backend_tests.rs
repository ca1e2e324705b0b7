//! HDFS backend integration tests, against an in-memory filesystem.

use std::sync::Arc;

use raster_catalog::codec::decode_tile;
use raster_catalog::layer::HeaderLocation;
use raster_catalog::{
    Backend, BackendFactory, BackendKind, LayerId, OptionBag, SpaceTimeKey, TileRequest,
};

use super::test_utils::{
    elevation_layer, sample_band, sample_multiband, temporal_layer, write_hdfs_layer,
    InMemoryHdfs,
};

const ROOT: &str = "/catalog";

async fn hdfs_backend(fs: &InMemoryHdfs) -> Backend {
    let options = OptionBag::new()
        .with("uri", "hdfs://namenode:8020/catalog/")
        .with("user", "geo");
    BackendFactory::new()
        .with_hadoop_fs(Arc::new(fs.clone()))
        .build(BackendKind::Hadoop, &options)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_read_tile_with_full_uri_path() {
    let fs = InMemoryHdfs::new();
    let location = HeaderLocation::Hdfs {
        path: "hdfs://namenode:8020/catalog/elevation/10".to_string(),
    };
    write_hdfs_layer(&fs, ROOT, &elevation_layer(location)).await;
    let backend = hdfs_backend(&fs).await;

    let header = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 10))
        .await
        .unwrap();
    let fields = header.fields();
    assert_eq!(fields[0], "SpatialKey");
    assert_eq!(fields[1], "Tile");
    assert_eq!(fields[2], "hdfs://namenode:8020/catalog/elevation/10");

    let encoded = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 5, 7))
        .await
        .unwrap();
    let tile = decode_tile(&encoded).unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 57)]);
}

#[tokio::test]
async fn test_relative_and_absolute_paths() {
    let fs = InMemoryHdfs::new();
    let relative = elevation_layer(HeaderLocation::Hdfs {
        path: "elevation/10".to_string(),
    });
    write_hdfs_layer(&fs, ROOT, &relative).await;

    let mut absolute = elevation_layer(HeaderLocation::Hdfs {
        path: "/archive/elevation/12".to_string(),
    });
    absolute.id = LayerId::new("elevation", 12);
    write_hdfs_layer(&fs, ROOT, &absolute).await;

    let backend = hdfs_backend(&fs).await;
    for zoom in [10, 12] {
        let tile = backend
            .value_reader
            .read_multiband(&TileRequest::spatial("elevation", zoom, 6, 7))
            .await
            .unwrap();
        assert_eq!(tile.bands(), &[sample_band(4, 4, 67)]);
    }

    assert_eq!(
        backend.attribute_store.zoom_levels("elevation").await.unwrap(),
        vec![10, 12]
    );
}

#[tokio::test]
async fn test_one_record_read_per_tile() {
    let fs = InMemoryHdfs::new();
    let location = HeaderLocation::Hdfs {
        path: "elevation/10".to_string(),
    };
    write_hdfs_layer(&fs, ROOT, &elevation_layer(location)).await;
    let backend = hdfs_backend(&fs).await;

    let request = TileRequest::spatial("elevation", 10, 5, 7);
    fs.reset_tracking();
    backend.value_reader.read_tile(&request).await.unwrap();
    // header, keyIndex, then the record
    assert_eq!(fs.read_count(), 3);

    // Nothing is cached between reads
    backend.value_reader.read_tile(&request).await.unwrap();
    assert_eq!(fs.read_count(), 6);

    // A type mismatch stops after the header
    fs.reset_tracking();
    let err = backend
        .value_reader
        .read_tile(&TileRequest::temporal("elevation", 10, 5, 7, "2020-01-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(fs.read_count(), 1);
}

#[tokio::test]
async fn test_temporal_multiband_and_missing_record() {
    let fs = InMemoryHdfs::new();
    let key = SpaceTimeKey::at(2, 3, "2021-03-04T00:00:00Z").unwrap();
    let fixture = temporal_layer(
        LayerId::new("sentinel", 6),
        HeaderLocation::Hdfs {
            path: "sentinel/6".to_string(),
        },
        "uint8raw",
        vec![(key, sample_multiband(4, 4, 40))],
    );
    write_hdfs_layer(&fs, ROOT, &fixture).await;
    let backend = hdfs_backend(&fs).await;

    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::temporal("sentinel", 6, 2, 3, "2021-03-04T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(tile, sample_multiband(4, 4, 40));

    let err = backend
        .value_reader
        .read_tile(&TileRequest::temporal("sentinel", 6, 9, 9, "2021-03-04T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_empty_catalog_lists_nothing() {
    let fs = InMemoryHdfs::new();
    let backend = hdfs_backend(&fs).await;
    assert!(backend.attribute_store.layer_ids().await.unwrap().is_empty());

    let err = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 10))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
