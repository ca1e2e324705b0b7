//! # Raster Catalog
//!
//! Read access to catalogs of tiled raster layers kept on a local
//! filesystem, HDFS, S3, or one of three column-family stores (Accumulo,
//! HBase, Cassandra).
//!
//! ## Features
//!
//! - **One interface per concern**: an [`AttributeStore`] reads layer headers
//!   and metadata, a [`ValueReader`] reads single tiles, whatever the backend
//! - **Typed dispatch**: every read resolves to one of four
//!   `{Spatial, Temporal} x {SingleBand, MultiBand}` paths; anything else is a
//!   type mismatch rather than a wrong decode
//! - **Canonical tiles**: every tile comes back as a [`MultibandTile`] with at
//!   least one band, and crosses process boundaries in a lossless wire format
//! - **Lenient configuration**: backends are configured from a string/int
//!   option bag with documented defaults
//!
//! ## Architecture
//!
//! - [`layer`] - Layer ids, headers, metadata, keys and key indices
//! - [`raster`] - Bands, cell types and multiband tiles
//! - [`codec`] - Tile wire codec and the stored record layout
//! - [`config`] - Option bag, per-backend configuration and the CLI
//! - [`catalog`] - Attribute store and value reader interfaces
//! - [`backend`] - The six backend adapters and the factory
//!
//! ## Example
//!
//! ```rust,no_run
//! use raster_catalog::{BackendFactory, BackendKind, LayerId, OptionBag, TileRequest};
//!
//! #[tokio::main]
//! async fn main() -> raster_catalog::Result<()> {
//!     let options = OptionBag::new().with("path", "/data/catalog");
//!     let backend = BackendFactory::new().build(BackendKind::File, &options).await?;
//!
//!     let header = backend.attribute_store.read_header(&LayerId::new("elevation", 10)).await?;
//!     println!("{:?}", header.fields());
//!
//!     let request = TileRequest::spatial("elevation", 10, 5, 7);
//!     let encoded = backend.value_reader.read_tile(&request).await?;
//!     let tile = raster_catalog::codec::decode_tile(&encoded)?;
//!     println!("{} band(s), {}x{}", tile.band_count(), tile.cols(), tile.rows());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod layer;
pub mod raster;

// Re-export commonly used types
pub use backend::{Backend, BackendFactory, BackendHandle, BackendKind};
pub use catalog::{AttributeStore, ReadPath, TileRequest, ValueReader};
pub use config::{BackendConfig, OptionBag, OptionValue};
pub use error::{BackendError, CatalogError, CodecError, Result};
pub use layer::{
    Key, KeyIndex, KeyKind, LayerHeader, LayerId, LayerMetadata, SpaceTimeKey, SpatialKey,
    ValueKind,
};
pub use raster::{Band, CellType, MultibandTile, NoData};
