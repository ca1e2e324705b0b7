//! Raster Catalog - inspect a tiled raster catalog from the command line.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raster_catalog::{
    catalog::METADATA_ATTRIBUTE,
    codec::decode_tile,
    config::{options_for, BackendArgs, Cli, Command, DefaultValue, LayerArgs, TileArgs},
    Backend, BackendFactory, BackendKind, CatalogError, KeyKind, LayerId, Result, TileRequest,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Defaults { kind } => {
            print_defaults(kind);
            Ok(())
        }
        Command::Layers { name } => run_layers(&cli.backend, name).await,
        Command::Header(layer) => run_header(&cli.backend, layer).await,
        Command::Metadata { layer, key_kind } => run_metadata(&cli.backend, layer, key_kind).await,
        Command::Tile(args) => run_tile(&cli.backend, args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn connect(args: &BackendArgs) -> Result<Backend> {
    let options = args.option_bag();
    info!(backend = %args.backend, options = options.len(), "Connecting to catalog");
    BackendFactory::new().build(args.backend, &options).await
}

// =============================================================================
// Catalog Commands
// =============================================================================

async fn run_layers(args: &BackendArgs, name: Option<String>) -> Result<()> {
    let backend = connect(args).await?;
    let store = &backend.attribute_store;
    match name {
        Some(name) => {
            for zoom in store.zoom_levels(&name).await? {
                println!("{}", zoom);
            }
        }
        None => {
            let ids = store.layer_ids().await?;
            if ids.is_empty() {
                println!("(no layers found)");
            }
            for id in ids {
                println!("{}", id);
            }
        }
    }
    Ok(())
}

async fn run_header(args: &BackendArgs, layer: LayerArgs) -> Result<()> {
    let backend = connect(args).await?;
    let id = LayerId::new(layer.name, layer.zoom);
    let header = backend.attribute_store.read_header(&id).await?;
    for field in header.fields() {
        println!("{}", field);
    }
    Ok(())
}

async fn run_metadata(args: &BackendArgs, layer: LayerArgs, key_kind: KeyKind) -> Result<()> {
    let backend = connect(args).await?;
    let id = LayerId::new(layer.name, layer.zoom);
    let metadata = backend.attribute_store.read_metadata(&id, key_kind).await?;
    println!("{}", render_attribute(&id, METADATA_ATTRIBUTE, &metadata)?);
    Ok(())
}

/// Pretty-print an attribute value, failing the command if it cannot be rendered.
fn render_attribute<T: Serialize>(id: &LayerId, attribute: &str, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| CatalogError::InvalidAttribute {
        layer: id.clone(),
        attribute: attribute.to_string(),
        reason: format!("cannot render as JSON: {}", e),
    })
}

async fn run_tile(args: &BackendArgs, tile: TileArgs) -> Result<()> {
    let backend = connect(args).await?;
    let request = TileRequest {
        key_kind: tile.key_kind,
        layer_name: tile.layer.name,
        zoom: tile.layer.zoom,
        col: tile.col,
        row: tile.row,
        instant: tile.instant,
    };
    let encoded = backend.value_reader.read_tile(&request).await?;

    if let Some(path) = tile.output {
        if let Err(e) = tokio::fs::write(&path, &encoded).await {
            return Err(CatalogError::backend(
                format!("writing {}", path.display()),
                e.into(),
            ));
        }
        info!(path = %path.display(), bytes = encoded.len(), "Tile written");
        return Ok(());
    }

    let decoded = decode_tile(&encoded)?;
    println!(
        "{} band(s), {}x{}, {} bytes encoded",
        decoded.band_count(),
        decoded.cols(),
        decoded.rows(),
        encoded.len()
    );
    for (i, band) in decoded.bands().iter().enumerate() {
        println!("  band {}: {}", i, band.cell_type());
    }
    Ok(())
}

// =============================================================================
// Defaults Command
// =============================================================================

fn print_defaults(kind: Option<BackendKind>) {
    let kinds: Vec<BackendKind> = match kind {
        Some(kind) => vec![kind],
        None => BackendKind::ALL.to_vec(),
    };
    for kind in kinds {
        println!("{}:", kind);
        for option in options_for(kind) {
            let default = match option.default {
                DefaultValue::Required => "(required)".to_string(),
                DefaultValue::Str("") => "(empty)".to_string(),
                DefaultValue::Str(s) => s.to_string(),
                DefaultValue::Int(n) => n.to_string(),
                DefaultValue::Flag(b) => (b as u8).to_string(),
            };
            println!("  {:<40} {:<16} {}", option.key, default, option.description);
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "raster_catalog=debug"
    } else {
        "raster_catalog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
