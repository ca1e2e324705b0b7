use serde::{Deserialize, Serialize};

use super::key::{LayerKey, SpaceTimeKey, SpatialKey};
use super::KeyKind;
use crate::raster::CellType;

/// Axis-aligned bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// Grid of tiles and the pixel size of each tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayout {
    pub layout_cols: u32,
    pub layout_rows: u32,
    pub tile_cols: u32,
    pub tile_rows: u32,
}

/// A tile layout anchored to an extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDefinition {
    pub extent: Extent,
    pub tile_layout: TileLayout,
}

impl LayoutDefinition {
    /// Map extent covered by the tile at (`col`, `row`), rows counted from the top.
    pub fn tile_extent(&self, col: i32, row: i32) -> Extent {
        let tw = self.extent.width() / self.tile_layout.layout_cols as f64;
        let th = self.extent.height() / self.tile_layout.layout_rows as f64;
        let xmin = self.extent.xmin + col as f64 * tw;
        let ymax = self.extent.ymax - row as f64 * th;
        Extent::new(xmin, ymax - th, xmin + tw, ymax)
    }
}

/// Smallest and largest key present in a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds<K> {
    pub min_key: K,
    pub max_key: K,
}

/// Layer-wide description of a tiled layer keyed by `K`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "K: LayerKey"))]
pub struct TileLayerMetadata<K> {
    pub cell_type: CellType,
    pub layout_definition: LayoutDefinition,
    pub extent: Extent,
    pub crs: String,
    /// `None` for a layer with no tiles
    #[serde(default)]
    pub bounds: Option<Bounds<K>>,
}

/// Metadata of either key type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerMetadata {
    Spatial(TileLayerMetadata<SpatialKey>),
    Temporal(TileLayerMetadata<SpaceTimeKey>),
}

impl LayerMetadata {
    /// Decode stored metadata as the variant for `kind`.
    pub fn from_json(value: serde_json::Value, kind: KeyKind) -> serde_json::Result<Self> {
        match kind {
            KeyKind::Spatial => serde_json::from_value(value).map(LayerMetadata::Spatial),
            KeyKind::Temporal => serde_json::from_value(value).map(LayerMetadata::Temporal),
        }
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            LayerMetadata::Spatial(_) => KeyKind::Spatial,
            LayerMetadata::Temporal(_) => KeyKind::Temporal,
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            LayerMetadata::Spatial(m) => m.cell_type,
            LayerMetadata::Temporal(m) => m.cell_type,
        }
    }

    pub fn layout_definition(&self) -> &LayoutDefinition {
        match self {
            LayerMetadata::Spatial(m) => &m.layout_definition,
            LayerMetadata::Temporal(m) => &m.layout_definition,
        }
    }

    pub fn crs(&self) -> &str {
        match self {
            LayerMetadata::Spatial(m) => &m.crs,
            LayerMetadata::Temporal(m) => &m.crs,
        }
    }

    pub fn into_spatial(self) -> Option<TileLayerMetadata<SpatialKey>> {
        match self {
            LayerMetadata::Spatial(m) => Some(m),
            LayerMetadata::Temporal(_) => None,
        }
    }

    pub fn into_temporal(self) -> Option<TileLayerMetadata<SpaceTimeKey>> {
        match self {
            LayerMetadata::Temporal(m) => Some(m),
            LayerMetadata::Spatial(_) => None,
        }
    }
}
