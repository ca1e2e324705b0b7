//! S3 backend integration tests.
//!
//! A real SDK client talks to a local S3-compatible endpoint ([`MockS3`]).
//!
//! Tests verify:
//! - Header fields and a single-band tile read
//! - Missing objects surface as NotFound with the requested key
//! - Layer listing follows ListObjectsV2 continuation tokens
//! - Records are read from the bucket named by the header

use std::sync::Arc;

use raster_catalog::codec::decode_tile;
use raster_catalog::layer::HeaderLocation;
use raster_catalog::{
    Backend, BackendFactory, BackendKind, LayerId, OptionBag, SpaceTimeKey, TileRequest,
};

use super::test_utils::{
    elevation_layer, sample_band, sample_multiband, temporal_layer, write_s3_layer, MockS3,
    LIST_PAGE_SIZE,
};

const BUCKET: &str = "rasters";
const PREFIX: &str = "catalog";

async fn s3_backend(s3: &MockS3) -> Backend {
    let client = s3.serve().await;
    let options = OptionBag::new()
        .with("bucket", BUCKET)
        .with("prefix", format!("/{}/", PREFIX));
    BackendFactory::new()
        .with_s3_client(client)
        .build(BackendKind::S3, &options)
        .await
        .unwrap()
}

fn elevation_location() -> HeaderLocation {
    HeaderLocation::S3 {
        bucket: BUCKET.to_string(),
        key: "catalog/elevation/10".to_string(),
    }
}

#[tokio::test]
async fn test_read_header_and_tile() {
    let s3 = MockS3::new();
    write_s3_layer(&s3, BUCKET, PREFIX, &elevation_layer(elevation_location())).await;
    let backend = s3_backend(&s3).await;
    assert_eq!(backend.kind(), BackendKind::S3);

    let header = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 10))
        .await
        .unwrap();
    assert_eq!(
        header.fields(),
        vec!["SpatialKey", "Tile", "rasters", "catalog/elevation/10"]
    );

    let before = s3.get_count();
    let encoded = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 5, 7))
        .await
        .unwrap();
    // header, keyIndex, then the record
    assert_eq!(s3.get_count() - before, 3);

    let tile = decode_tile(&encoded).unwrap();
    assert_eq!(tile.bands(), &[sample_band(4, 4, 57)]);
}

#[tokio::test]
async fn test_missing_objects_are_not_found() {
    let s3 = MockS3::new();
    write_s3_layer(&s3, BUCKET, PREFIX, &elevation_layer(elevation_location())).await;
    let backend = s3_backend(&s3).await;

    let err = backend
        .value_reader
        .read_tile(&TileRequest::spatial("elevation", 10, 99999, 99999))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);
    assert!(
        err.to_string().contains("SpatialKey(99999, 99999) of Tile layer elevation:10"),
        "{}",
        err
    );

    let err = backend
        .attribute_store
        .read_header(&LayerId::new("elevation", 11))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);

    let err = backend
        .value_reader
        .read_tile(&TileRequest::temporal("elevation", 10, 5, 7, "2020-01-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[tokio::test]
async fn test_layer_listing_pages() {
    let s3 = MockS3::new();
    for zoom in 1..=5 {
        let mut fixture = elevation_layer(HeaderLocation::S3 {
            bucket: BUCKET.to_string(),
            key: format!("catalog/elevation/{}", zoom),
        });
        fixture.id = LayerId::new("elevation", zoom);
        write_s3_layer(&s3, BUCKET, PREFIX, &fixture).await;
    }
    // Attributes outside the prefix are not part of this catalog
    s3.put(BUCKET, "archive/_attributes/header__old__3.json", "{}").await;
    let backend = s3_backend(&s3).await;

    let ids = backend.attribute_store.layer_ids().await.unwrap();
    assert_eq!(ids, (1..=5).map(|z| LayerId::new("elevation", z)).collect::<Vec<_>>());
    assert_eq!(s3.list_count(), 5usize.div_ceil(LIST_PAGE_SIZE));

    assert_eq!(
        backend.attribute_store.zoom_levels("elevation").await.unwrap(),
        vec![1, 2, 3, 4, 5]
    );
}

#[tokio::test]
async fn test_records_read_from_header_bucket() {
    let s3 = MockS3::new();
    let instant = "2021-03-04T00:00:00Z";
    let fixture = temporal_layer(
        LayerId::new("sentinel", 6),
        HeaderLocation::S3 {
            bucket: "sentinel-tiles".to_string(),
            key: "s2/6".to_string(),
        },
        "uint8raw",
        vec![(SpaceTimeKey::at(2, 3, instant).unwrap(), sample_multiband(4, 4, 40))],
    );
    write_s3_layer(&s3, BUCKET, PREFIX, &fixture).await;
    let backend = s3_backend(&s3).await;

    let tile = backend
        .value_reader
        .read_multiband(&TileRequest::temporal("sentinel", 6, 2, 3, instant))
        .await
        .unwrap();
    assert_eq!(tile, sample_multiband(4, 4, 40));

    let reader = BackendFactory::value_reader_for(backend.attribute_store.clone());
    assert!(Arc::ptr_eq(reader.attribute_store(), &backend.attribute_store));
    let again = reader
        .read_multiband(&TileRequest::temporal("sentinel", 6, 2, 3, instant))
        .await
        .unwrap();
    assert_eq!(again, tile);
}
