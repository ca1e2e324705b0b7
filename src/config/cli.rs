//! Command-line interface.
//!
//! The backend is chosen with `--backend` and configured with repeated
//! `-o key=value` options, the same option bag the library's factory takes.
//!
//! # Environment Variables
//!
//! - `RASTER_CATALOG_BACKEND` - Backend kind (file, hdfs, s3, accumulo, hbase, cassandra)
//! - `RASTER_CATALOG_PATH` - Shorthand for `-o path=...` on the file backend
//! - `RASTER_CATALOG_BUCKET` - Shorthand for `-o bucket=...` on the s3 backend

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::backends::{OPT_BUCKET, OPT_PATH};
use super::options::{OptionBag, OptionValue};
use crate::backend::BackendKind;
use crate::layer::KeyKind;

/// Raster Catalog - read layer headers, metadata and tiles from a tiled
/// raster catalog.
#[derive(Parser, Debug, Clone)]
#[command(name = "raster-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Enable verbose logging.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Backend holding the catalog.
    #[arg(long, global = true, default_value = "file", env = "RASTER_CATALOG_BACKEND")]
    pub backend: BackendKind,

    /// Backend option as key=value; repeat for several options.
    #[arg(short = 'o', long = "option", global = true, value_parser = OptionBag::parse_pair)]
    pub options: Vec<(String, OptionValue)>,

    /// Catalog root for the file backend.
    #[arg(long, global = true, env = "RASTER_CATALOG_PATH")]
    pub path: Option<String>,

    /// Catalog bucket for the s3 backend.
    #[arg(long, global = true, env = "RASTER_CATALOG_BUCKET")]
    pub bucket: Option<String>,
}

impl BackendArgs {
    /// Option bag for the factory. Explicit `-o` options win over the
    /// shorthand flags.
    pub fn option_bag(&self) -> OptionBag {
        let mut bag = OptionBag::new();
        if let Some(path) = &self.path {
            bag.insert(OPT_PATH, path.as_str());
        }
        if let Some(bucket) = &self.bucket {
            bag.insert(OPT_BUCKET, bucket.as_str());
        }
        for (key, value) in &self.options {
            bag.insert(key.as_str(), value.clone());
        }
        bag
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the layers in the catalog.
    Layers {
        /// Only list zoom levels of this layer.
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a layer's header fields.
    Header(LayerArgs),

    /// Print a layer's metadata as JSON.
    Metadata {
        #[command(flatten)]
        layer: LayerArgs,

        /// Key kind the layer was written with.
        #[arg(long, default_value = "spatial")]
        key_kind: KeyKind,
    },

    /// Read one tile.
    Tile(TileArgs),

    /// Print the recognized options and defaults of a backend.
    Defaults {
        /// Backend to describe; all backends when omitted.
        #[arg(value_name = "BACKEND")]
        kind: Option<BackendKind>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LayerArgs {
    /// Layer name.
    pub name: String,

    /// Zoom level.
    pub zoom: u32,
}

#[derive(Args, Debug, Clone)]
pub struct TileArgs {
    #[command(flatten)]
    pub layer: LayerArgs,

    /// Tile column.
    #[arg(allow_negative_numbers = true)]
    pub col: i32,

    /// Tile row.
    #[arg(allow_negative_numbers = true)]
    pub row: i32,

    /// Key kind of the request.
    #[arg(long, default_value = "spatial")]
    pub key_kind: KeyKind,

    /// ISO-8601 instant for temporal requests.
    #[arg(long)]
    pub instant: Option<String>,

    /// Write the wire-encoded tile to this file instead of printing a summary.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
