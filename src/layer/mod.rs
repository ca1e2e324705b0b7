//! Layer identity and the records that describe a stored layer.
//!
//! A layer is addressed by a [`LayerId`] (name + zoom). Each stored layer has
//! a [`LayerHeader`] describing where and how its tiles are kept, a
//! [`LayerMetadata`] record describing its extent and layout, and a
//! [`KeyIndex`] that maps tile keys to storage indices.

mod header;
mod key;
mod key_index;
mod metadata;

pub use header::{HeaderLocation, LayerHeader};
pub use key::{parse_instant, Key, LayerKey, SpaceTimeKey, SpatialKey};
pub use key_index::KeyIndex;
pub use metadata::{Bounds, Extent, LayerMetadata, LayoutDefinition, TileLayerMetadata, TileLayout};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of one zoom level of a named layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId {
    pub name: String,
    pub zoom: u32,
}

impl LayerId {
    pub fn new(name: impl Into<String>, zoom: u32) -> Self {
        Self {
            name: name.into(),
            zoom,
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.zoom)
    }
}

impl FromStr for LayerId {
    type Err = String;

    /// Parse `name:zoom`; the name may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, zoom) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("layer id '{}' is not of the form name:zoom", s))?;
        let zoom = zoom
            .parse()
            .map_err(|_| format!("invalid zoom in layer id '{}'", s))?;
        if name.is_empty() {
            return Err(format!("layer id '{}' has an empty name", s));
        }
        Ok(Self::new(name, zoom))
    }
}

/// Key type of a layer: spatial, or spatial plus time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyKind {
    #[serde(rename = "SpatialKey", alias = "geotrellis.spark.SpatialKey")]
    Spatial,
    #[serde(rename = "SpaceTimeKey", alias = "geotrellis.spark.SpaceTimeKey")]
    Temporal,
}

impl KeyKind {
    pub fn tag(&self) -> u8 {
        match self {
            KeyKind::Spatial => 0,
            KeyKind::Temporal => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(KeyKind::Spatial),
            1 => Some(KeyKind::Temporal),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Spatial => f.write_str("SpatialKey"),
            KeyKind::Temporal => f.write_str("SpaceTimeKey"),
        }
    }
}

impl FromStr for KeyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spatial" | "spatialkey" | "geotrellis.spark.spatialkey" => Ok(KeyKind::Spatial),
            "temporal" | "spacetime" | "spacetimekey" | "geotrellis.spark.spacetimekey" => {
                Ok(KeyKind::Temporal)
            }
            _ => Err(format!("unknown key kind '{}': expected spatial or temporal", s)),
        }
    }
}

/// Value type of a layer: single-band or multiband tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "Tile", alias = "geotrellis.raster.Tile")]
    SingleBand,
    #[serde(rename = "MultibandTile", alias = "geotrellis.raster.MultibandTile")]
    MultiBand,
}

impl ValueKind {
    pub fn tag(&self) -> u8 {
        match self {
            ValueKind::SingleBand => 0,
            ValueKind::MultiBand => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ValueKind::SingleBand),
            1 => Some(ValueKind::MultiBand),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::SingleBand => f.write_str("Tile"),
            ValueKind::MultiBand => f.write_str("MultibandTile"),
        }
    }
}
