use bytes::{BufMut, Bytes, BytesMut};

use super::cell::{CellKind, CellType, NoData};
use crate::error::CodecError;

/// A primitive that can be stored in a band.
pub trait CellValue: Copy {
    const KIND: CellKind;

    fn put(self, buf: &mut BytesMut);
}

macro_rules! cell_value {
    ($ty:ty, $kind:expr, $put:ident) => {
        impl CellValue for $ty {
            const KIND: CellKind = $kind;

            fn put(self, buf: &mut BytesMut) {
                buf.$put(self);
            }
        }
    };
}

cell_value!(i8, CellKind::Int8, put_i8);
cell_value!(u8, CellKind::UInt8, put_u8);
cell_value!(i16, CellKind::Int16, put_i16_le);
cell_value!(u16, CellKind::UInt16, put_u16_le);
cell_value!(i32, CellKind::Int32, put_i32_le);
cell_value!(f32, CellKind::Float32, put_f32_le);
cell_value!(f64, CellKind::Float64, put_f64_le);

/// A single-band raster.
///
/// Cells are kept as raw little-endian bytes in row-major order (bit cells
/// are packed, least significant bit first). The payload length always
/// matches `cols * rows` for the cell type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    cell_type: CellType,
    cols: u32,
    rows: u32,
    data: Bytes,
}

impl Band {
    /// Wrap a raw payload, checking its length.
    pub fn new(cell_type: CellType, cols: u32, rows: u32, data: Bytes) -> Result<Self, CodecError> {
        let expected = (cols as usize)
            .checked_mul(rows as usize)
            .and_then(|cells| cell_type.kind().bytes_for(cells))
            .ok_or_else(|| CodecError::TooLarge {
                cell_type: cell_type.to_string(),
                cols,
                rows,
            })?;
        if data.len() != expected {
            return Err(CodecError::LengthMismatch {
                cell_type: cell_type.to_string(),
                cols,
                rows,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            cell_type,
            cols,
            rows,
            data,
        })
    }

    /// Build a band from typed values.
    ///
    /// # Errors
    /// Fails if `values.len() != cols * rows` or if `no_data` is not valid
    /// for the value type.
    pub fn from_values<T: CellValue>(
        cols: u32,
        rows: u32,
        no_data: NoData,
        values: &[T],
    ) -> Result<Self, CodecError> {
        let cell_type = CellType::new(T::KIND, no_data).map_err(CodecError::InvalidCellType)?;
        let mut buf = BytesMut::with_capacity(T::KIND.bytes_for(values.len()).unwrap_or(0));
        for v in values {
            v.put(&mut buf);
        }
        Self::new(cell_type, cols, rows, buf.freeze())
    }

    /// Build a bit band from booleans.
    pub fn from_bits(cols: u32, rows: u32, values: &[bool]) -> Result<Self, CodecError> {
        let mut packed = vec![0u8; values.len().div_ceil(8)];
        for (i, _) in values.iter().enumerate().filter(|(_, v)| **v) {
            packed[i / 8] |= 1 << (i % 8);
        }
        Self::new(CellType::raw(CellKind::Bool), cols, rows, Bytes::from(packed))
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Raw cell payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Value of the cell at (`col`, `row`) widened to `f64`.
    ///
    /// Returns `None` outside the band.
    pub fn get(&self, col: u32, row: u32) -> Option<f64> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(self.cell_at(row as usize * self.cols as usize + col as usize))
    }

    /// Whether the cell at (`col`, `row`) holds the no-data marker.
    pub fn is_no_data(&self, col: u32, row: u32) -> bool {
        self.get(col, row)
            .map(|v| self.cell_type.is_no_data(v))
            .unwrap_or(false)
    }

    /// All cells widened to `f64`, row-major.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.cell_count()).map(|i| self.cell_at(i)).collect()
    }

    fn cell_at(&self, i: usize) -> f64 {
        let d = &self.data;
        match self.cell_type.kind() {
            CellKind::Bool => ((d[i / 8] >> (i % 8)) & 1) as f64,
            CellKind::Int8 => d[i] as i8 as f64,
            CellKind::UInt8 => d[i] as f64,
            CellKind::Int16 => i16::from_le_bytes([d[2 * i], d[2 * i + 1]]) as f64,
            CellKind::UInt16 => u16::from_le_bytes([d[2 * i], d[2 * i + 1]]) as f64,
            CellKind::Int32 => {
                let o = 4 * i;
                i32::from_le_bytes([d[o], d[o + 1], d[o + 2], d[o + 3]]) as f64
            }
            CellKind::Float32 => {
                let o = 4 * i;
                f32::from_le_bytes([d[o], d[o + 1], d[o + 2], d[o + 3]]) as f64
            }
            CellKind::Float64 => {
                let o = 8 * i;
                let mut b = [0u8; 8];
                b.copy_from_slice(&d[o..o + 8]);
                f64::from_le_bytes(b)
            }
        }
    }
}
