//! File backend integration tests.
//!
//! Tests verify:
//! - Header fields and single-band tile reads (lifted to one band)
//! - Multiband and temporal read paths
//! - NotFound for missing keys and layers, TypeMismatch for the wrong key kind
//! - Layer listing and metadata decoding

use std::path::Path;

use tempfile::TempDir;

use raster_catalog::codec::decode_tile;
use raster_catalog::layer::HeaderLocation;
use raster_catalog::{
    Backend, BackendFactory, BackendKind, KeyKind, LayerId, MultibandTile, OptionBag,
    SpaceTimeKey, SpatialKey, TileRequest, ValueKind,
};

use super::test_utils::{
    elevation_layer, sample_band, sample_multiband, spatial_layer, temporal_layer,
    write_file_layer,
};

const INSTANT: &str = "2020-06-01T00:00:00Z";

async fn file_backend(root: &Path) -> Backend {
    let options = OptionBag::new().with("path", root.to_string_lossy().to_string());
    BackendFactory::new()
        .build(BackendKind::File, &options)
        .await
        .unwrap()
}

fn absolute_location(root: &Path, rel: &str) -> HeaderLocation {
    HeaderLocation::File {
        path: root.join(rel).to_string_lossy().to_string(),
    }
}

// =============================================================================
// Spatial Single-band Reads
// =============================================================================

#[tokio::test]
async fn test_read_header_fields() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    let layer_path = dir.path().join("elevation/10").to_string_lossy().to_string();
    write_file_layer(dir.path(), &elevation_layer(location)).await;

    let backend = file_backend(dir.path()).await;
    let header = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 10))
        .await
        .unwrap();

    assert_eq!(
        header.fields(),
        vec!["SpatialKey".to_string(), "Tile".to_string(), layer_path]
    );
    assert_eq!(backend.kind(), BackendKind::File);
}

#[tokio::test]
async fn test_single_band_tile_is_lifted() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    write_file_layer(dir.path(), &elevation_layer(location)).await;
    let backend = file_backend(dir.path()).await;

    let request = TileRequest::spatial("elevation", 10, 5, 7);
    let encoded = backend.value_reader.read_tile(&request).await.unwrap();
    let tile = decode_tile(&encoded).unwrap();

    assert_eq!(tile.band_count(), 1);
    assert_eq!(tile.band(0), Some(&sample_band(4, 4, 57)));

    // The neighbouring tile shares no record with (5, 7)
    let other = backend
        .value_reader
        .read_multiband(&TileRequest::spatial("elevation", 10, 6, 7))
        .await
        .unwrap();
    assert_eq!(other.bands(), &[sample_band(4, 4, 67)]);
}

#[tokio::test]
async fn test_relative_header_path() {
    let dir = TempDir::new().unwrap();
    let location = HeaderLocation::File {
        path: "layers/elevation/10".to_string(),
    };
    write_file_layer(dir.path(), &elevation_layer(location)).await;
    let backend = file_backend(dir.path()).await;

    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::spatial("elevation", 10, 0, 0))
        .await
        .unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 0)]);
}

// =============================================================================
// Error Kinds
// =============================================================================

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    write_file_layer(dir.path(), &elevation_layer(location)).await;
    let backend = file_backend(dir.path()).await;

    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 99999, 99999))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
    let message = err.to_string();
    for part in ["SpatialKey(99999, 99999)", "Tile", "elevation:10"] {
        assert!(message.contains(part), "{} missing from: {}", part, message);
    }

    // Keys off the curve never reach the backend
    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, -1, 3))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
    assert!(err.to_string().contains("SpatialKey(-1, 3) of Tile layer elevation:10"));
}

#[tokio::test]
async fn test_missing_layer_is_not_found() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    write_file_layer(dir.path(), &elevation_layer(location)).await;
    let backend = file_backend(dir.path()).await;

    let err = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 11))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("landcover", 10, 5, 7))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_temporal_request_on_spatial_layer() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    write_file_layer(dir.path(), &elevation_layer(location)).await;
    let backend = file_backend(dir.path()).await;

    let request = TileRequest::temporal("elevation", 10, 5, 7, INSTANT);
    let err = backend.value_reader.read_tile(&request).await.unwrap_err();
    assert!(err.is_type_mismatch(), "unexpected error: {}", err);

    // The mismatch is reported even without a usable instant
    let request = TileRequest::temporal("elevation", 10, 5, 7, "");
    let err = backend.value_reader.read_tile(&request).await.unwrap_err();
    assert!(err.is_type_mismatch(), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_record_of_wrong_value_kind() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    let mut fixture = elevation_layer(location);
    // header claims multiband, records hold single bands
    fixture.header.value_class = ValueKind::MultiBand;
    write_file_layer(dir.path(), &fixture).await;
    let backend = file_backend(dir.path()).await;

    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 5, 7))
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch(), "unexpected error: {}", err);
}

// =============================================================================
// Multiband and Temporal Paths
// =============================================================================

#[tokio::test]
async fn test_spatial_multiband_read() {
    let dir = TempDir::new().unwrap();
    let expected = sample_multiband(4, 4, 12);
    let fixture = spatial_layer(
        LayerId::new("landsat", 8),
        absolute_location(dir.path(), "landsat/8"),
        "uint8raw",
        vec![
            (SpatialKey::new(3, 4), expected.clone()),
            (SpatialKey::new(4, 4), sample_multiband(4, 4, 99)),
        ],
    );
    write_file_layer(dir.path(), &fixture).await;
    let backend = file_backend(dir.path()).await;

    let id = LayerId::new("landsat", 8);
    assert_eq!(
        backend.value_reader.value_class(&id).await.unwrap(),
        ValueKind::MultiBand
    );

    let encoded = backend
        .value_reader
        .read_tile(&TileRequest::spatial("landsat", 8, 3, 4))
        .await
        .unwrap();
    let tile: MultibandTile = decode_tile(&encoded).unwrap();
    assert_eq!(tile.band_count(), 3);
    assert_eq!(tile, expected);
    assert!(tile.band(1).unwrap().is_no_data(0, 0));
}

#[tokio::test]
async fn test_temporal_reads() {
    let dir = TempDir::new().unwrap();
    let at = SpaceTimeKey::at(1, 2, INSTANT).unwrap();
    let single = temporal_layer(
        LayerId::new("ndvi", 4),
        absolute_location(dir.path(), "ndvi/4"),
        "uint8raw",
        vec![(at, sample_band(4, 4, 7))],
    );
    let multi = temporal_layer(
        LayerId::new("sentinel", 4),
        absolute_location(dir.path(), "sentinel/4"),
        "uint8raw",
        vec![(at, sample_multiband(4, 4, 3))],
    );
    write_file_layer(dir.path(), &single).await;
    write_file_layer(dir.path(), &multi).await;
    let backend = file_backend(dir.path()).await;

    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::temporal("ndvi", 4, 1, 2, INSTANT))
        .await
        .unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 7)]);

    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::temporal("sentinel", 4, 1, 2, INSTANT))
        .await
        .unwrap();
    assert_eq!(tile, sample_multiband(4, 4, 3));

    // Same day bucket, different instant: the record exists but not the key
    let err = backend
        .value_reader
        .read_tile(&TileRequest::temporal("ndvi", 4, 1, 2, "2020-06-01T06:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);

    // A spatial request against a temporal layer is a mismatch
    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("ndvi", 4, 1, 2))
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch());

    // Unparseable instants are configuration errors
    let err = backend
        .value_reader
        .read_tile(&TileRequest::temporal("ndvi", 4, 1, 2, "last tuesday"))
        .await
        .unwrap_err();
    assert!(err.is_config());
}

// =============================================================================
// Catalog Queries
// =============================================================================

#[tokio::test]
async fn test_read_metadata() {
    let dir = TempDir::new().unwrap();
    let location = absolute_location(dir.path(), "elevation/10");
    write_file_layer(dir.path(), &elevation_layer(location)).await;
    let backend = file_backend(dir.path()).await;
    let id = LayerId::new("elevation", 10);

    let metadata = backend
        .attribute_store
        .read_metadata(&id, KeyKind::Spatial)
        .await
        .unwrap();
    assert_eq!(metadata.kind(), KeyKind::Spatial);
    assert_eq!(metadata.crs(), "EPSG:3857");
    assert_eq!(metadata.cell_type().to_string(), "uint8raw");
    let spatial = metadata.into_spatial().unwrap();
    assert_eq!(spatial.bounds.unwrap().max_key, SpatialKey::new(15, 15));

    let err = backend
        .attribute_store
        .read_metadata(&id, KeyKind::Temporal)
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[tokio::test]
async fn test_layer_listing() {
    let dir = TempDir::new().unwrap();
    let backend = file_backend(dir.path()).await;
    assert!(backend.attribute_store.layer_ids().await.unwrap().is_empty());

    write_file_layer(
        dir.path(),
        &elevation_layer(absolute_location(dir.path(), "elevation/10")),
    )
    .await;
    let mut zoom_12 = elevation_layer(absolute_location(dir.path(), "elevation/12"));
    zoom_12.id = LayerId::new("elevation", 12);
    write_file_layer(dir.path(), &zoom_12).await;

    let store = &backend.attribute_store;
    assert_eq!(
        store.layer_ids().await.unwrap(),
        vec![LayerId::new("elevation", 10), LayerId::new("elevation", 12)]
    );
    assert_eq!(store.zoom_levels("elevation").await.unwrap(), vec![10, 12]);
    assert!(store.zoom_levels("landcover").await.unwrap().is_empty());
    assert!(store.layer_exists(&LayerId::new("elevation", 12)).await.unwrap());
    assert!(!store.layer_exists(&LayerId::new("elevation", 11)).await.unwrap());
}
