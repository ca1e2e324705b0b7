use super::band::Band;
use crate::error::CodecError;

/// The canonical tile shape: one or more bands over the same footprint.
///
/// A stored single-band tile is always lifted into a one-band
/// `MultibandTile` on read, so consumers only ever see this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultibandTile {
    bands: Vec<Band>,
}

impl MultibandTile {
    /// Create a tile, checking that there is at least one band and that all
    /// bands share the first band's dimensions.
    pub fn new(bands: Vec<Band>) -> Result<Self, CodecError> {
        let first = bands.first().ok_or(CodecError::NoBands)?;
        let (cols, rows) = (first.cols(), first.rows());
        for (index, band) in bands.iter().enumerate().skip(1) {
            if band.cols() != cols || band.rows() != rows {
                return Err(CodecError::DimensionMismatch {
                    index,
                    cols: band.cols(),
                    rows: band.rows(),
                    expected_cols: cols,
                    expected_rows: rows,
                });
            }
        }
        Ok(Self { bands })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn cols(&self) -> u32 {
        self.bands[0].cols()
    }

    pub fn rows(&self) -> u32 {
        self.bands[0].rows()
    }

    pub fn into_bands(self) -> Vec<Band> {
        self.bands
    }
}

impl From<Band> for MultibandTile {
    fn from(band: Band) -> Self {
        Self { bands: vec![band] }
    }
}
