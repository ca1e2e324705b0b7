//! Cell types and no-data conventions.
//!
//! A cell type pairs a storage kind (bit, 8/16/32-bit integer, 32/64-bit
//! float) with a no-data policy. The string form follows the naming used by
//! catalogs written by the ingestion pipeline: `int16`, `uint8raw`,
//! `float32ud-9999`, ...

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Storage kind of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    Float32,
    Float64,
}

impl CellKind {
    /// All kinds, ordered so that no name is a prefix of a later one.
    pub const ALL: [CellKind; 8] = [
        CellKind::Bool,
        CellKind::UInt8,
        CellKind::UInt16,
        CellKind::Int8,
        CellKind::Int16,
        CellKind::Int32,
        CellKind::Float32,
        CellKind::Float64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Bool => "bool",
            CellKind::Int8 => "int8",
            CellKind::UInt8 => "uint8",
            CellKind::Int16 => "int16",
            CellKind::UInt16 => "uint16",
            CellKind::Int32 => "int32",
            CellKind::Float32 => "float32",
            CellKind::Float64 => "float64",
        }
    }

    /// Wire tag for this kind.
    pub fn tag(&self) -> u8 {
        match self {
            CellKind::Bool => 0,
            CellKind::Int8 => 1,
            CellKind::UInt8 => 2,
            CellKind::Int16 => 3,
            CellKind::UInt16 => 4,
            CellKind::Int32 => 5,
            CellKind::Float32 => 6,
            CellKind::Float64 => 7,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.tag() == tag)
    }

    pub fn bits(&self) -> usize {
        match self {
            CellKind::Bool => 1,
            CellKind::Int8 | CellKind::UInt8 => 8,
            CellKind::Int16 | CellKind::UInt16 => 16,
            CellKind::Int32 | CellKind::Float32 => 32,
            CellKind::Float64 => 64,
        }
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, CellKind::Float32 | CellKind::Float64)
    }

    /// Number of payload bytes for `cells` cells of this kind.
    ///
    /// Bit cells are packed eight to a byte. `None` if the size overflows.
    pub fn bytes_for(&self, cells: usize) -> Option<usize> {
        match self {
            CellKind::Bool => Some(cells.div_ceil(8)),
            other => cells.checked_mul(other.bits() / 8),
        }
    }

    /// The sentinel used when the cell type carries a constant no-data value.
    pub fn constant_no_data(&self) -> Option<f64> {
        match self {
            CellKind::Bool => None,
            CellKind::Int8 => Some(i8::MIN as f64),
            CellKind::UInt8 | CellKind::UInt16 => Some(0.0),
            CellKind::Int16 => Some(i16::MIN as f64),
            CellKind::Int32 => Some(i32::MIN as f64),
            CellKind::Float32 | CellKind::Float64 => Some(f64::NAN),
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            CellKind::Bool => (0.0, 1.0),
            CellKind::Int8 => (i8::MIN as f64, i8::MAX as f64),
            CellKind::UInt8 => (0.0, u8::MAX as f64),
            CellKind::Int16 => (i16::MIN as f64, i16::MAX as f64),
            CellKind::UInt16 => (0.0, u16::MAX as f64),
            CellKind::Int32 => (i32::MIN as f64, i32::MAX as f64),
            CellKind::Float32 => (f32::MIN as f64, f32::MAX as f64),
            CellKind::Float64 => (f64::MIN, f64::MAX),
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// No-data policy of a cell type.
#[derive(Debug, Clone, Copy)]
pub enum NoData {
    /// Every cell value is data
    Raw,
    /// The kind's constant sentinel marks no-data
    Constant,
    /// A caller-chosen value marks no-data
    UserDefined(f64),
}

impl PartialEq for NoData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NoData::Raw, NoData::Raw) | (NoData::Constant, NoData::Constant) => true,
            (NoData::UserDefined(a), NoData::UserDefined(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for NoData {}

/// A cell kind plus its no-data policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellType {
    kind: CellKind,
    no_data: NoData,
}

impl CellType {
    /// Create a cell type, validating that a user-defined no-data value is
    /// representable in the cell kind.
    pub fn new(kind: CellKind, no_data: NoData) -> Result<Self, String> {
        match no_data {
            NoData::Constant if kind == CellKind::Bool => {
                Err("bool cells have no constant no-data value".to_string())
            }
            NoData::UserDefined(_) if kind == CellKind::Bool => {
                Err("bool cells cannot carry a user-defined no-data value".to_string())
            }
            NoData::UserDefined(value) if !kind.is_floating_point() => {
                let (min, max) = kind.range();
                if value.fract() != 0.0 || value < min || value > max {
                    Err(format!("no-data value {} is not a valid {} cell", value, kind))
                } else {
                    Ok(Self { kind, no_data })
                }
            }
            _ => Ok(Self { kind, no_data }),
        }
    }

    /// Cell type with the kind's constant no-data sentinel (raw for bool).
    pub fn constant(kind: CellKind) -> Self {
        let no_data = if kind == CellKind::Bool {
            NoData::Raw
        } else {
            NoData::Constant
        };
        Self { kind, no_data }
    }

    pub fn raw(kind: CellKind) -> Self {
        Self {
            kind,
            no_data: NoData::Raw,
        }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn no_data(&self) -> NoData {
        self.no_data
    }

    /// The value that marks a no-data cell, if any.
    pub fn no_data_value(&self) -> Option<f64> {
        match self.no_data {
            NoData::Raw => None,
            NoData::Constant => self.kind.constant_no_data(),
            NoData::UserDefined(v) => Some(v),
        }
    }

    /// Whether `value` is this cell type's no-data marker.
    pub fn is_no_data(&self, value: f64) -> bool {
        match self.no_data_value() {
            None => false,
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.no_data {
            NoData::Raw if self.kind == CellKind::Bool => write!(f, "bool"),
            NoData::Raw => write!(f, "{}raw", self.kind),
            NoData::Constant => write!(f, "{}", self.kind),
            NoData::UserDefined(v) if self.kind.is_floating_point() => {
                write!(f, "{}ud{}", self.kind, v)
            }
            NoData::UserDefined(v) => write!(f, "{}ud{}", self.kind, v as i64),
        }
    }
}

impl FromStr for CellType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let kind = CellKind::ALL
            .iter()
            .copied()
            .find(|k| s.starts_with(k.name()))
            .ok_or_else(|| format!("unknown cell type '{}'", s))?;
        let rest = &s[kind.name().len()..];

        let no_data = match rest {
            "" if kind == CellKind::Bool => NoData::Raw,
            "" => NoData::Constant,
            "raw" => NoData::Raw,
            ud if ud.starts_with("ud") => {
                let value: f64 = ud[2..]
                    .parse()
                    .map_err(|_| format!("invalid no-data value in cell type '{}'", s))?;
                NoData::UserDefined(value)
            }
            _ => return Err(format!("unknown cell type '{}'", s)),
        };

        CellType::new(kind, no_data)
    }
}

impl Serialize for CellType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
