//! In-memory raster values.
//!
//! - [`CellType`]: cell kind plus no-data policy
//! - [`Band`]: one single-band raster as raw row-major bytes
//! - [`MultibandTile`]: the canonical, never-empty tile shape

mod band;
mod cell;
mod multiband;

pub use band::{Band, CellValue};
pub use cell::{CellKind, CellType, NoData};
pub use multiband::MultibandTile;
