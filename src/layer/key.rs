use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::KeyKind;
use crate::error::{CatalogError, Result};

/// Common behaviour of the two key types.
pub trait LayerKey:
    Copy + PartialEq + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: KeyKind;

    /// Narrow a dynamically-typed key to this key type.
    fn from_key(key: &Key) -> Option<Self>;
}

/// Column/row address of a tile in a layer's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpatialKey {
    pub col: i32,
    pub row: i32,
}

impl SpatialKey {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl Ord for SpatialKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.row, self.col).cmp(&(other.row, other.col))
    }
}

impl PartialOrd for SpatialKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SpatialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpatialKey({}, {})", self.col, self.row)
    }
}

impl LayerKey for SpatialKey {
    const KIND: KeyKind = KeyKind::Spatial;

    fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Spatial(k) => Some(*k),
            Key::SpaceTime(_) => None,
        }
    }
}

/// Column/row address plus an instant, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceTimeKey {
    pub col: i32,
    pub row: i32,
    pub instant: i64,
}

impl SpaceTimeKey {
    pub fn new(col: i32, row: i32, instant: i64) -> Self {
        Self { col, row, instant }
    }

    /// Build a key from an ISO-8601 timestamp.
    pub fn at(col: i32, row: i32, instant: &str) -> Result<Self> {
        Ok(Self::new(col, row, parse_instant(instant)?))
    }

    pub fn spatial_key(&self) -> SpatialKey {
        SpatialKey::new(self.col, self.row)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.instant).single()
    }
}

impl Ord for SpaceTimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.row, self.col, self.instant).cmp(&(other.row, other.col, other.instant))
    }
}

impl PartialOrd for SpaceTimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SpaceTimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time() {
            Some(t) => write!(f, "SpaceTimeKey({}, {}, {})", self.col, self.row, t.to_rfc3339()),
            None => write!(f, "SpaceTimeKey({}, {}, {}ms)", self.col, self.row, self.instant),
        }
    }
}

impl LayerKey for SpaceTimeKey {
    const KIND: KeyKind = KeyKind::Temporal;

    fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::SpaceTime(k) => Some(*k),
            Key::Spatial(_) => None,
        }
    }
}

/// A key of either type, as built from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Spatial(SpatialKey),
    SpaceTime(SpaceTimeKey),
}

impl Key {
    pub fn kind(&self) -> KeyKind {
        match self {
            Key::Spatial(_) => KeyKind::Spatial,
            Key::SpaceTime(_) => KeyKind::Temporal,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Spatial(k) => fmt::Display::fmt(k, f),
            Key::SpaceTime(k) => fmt::Display::fmt(k, f),
        }
    }
}

/// Parse an ISO-8601 instant into epoch milliseconds.
///
/// Accepts RFC 3339 timestamps with an offset, naive date-times (taken as
/// UTC) and bare dates (midnight UTC).
pub fn parse_instant(s: &str) -> Result<i64> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t.and_utc().timestamp_millis());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc().timestamp_millis());
        }
    }
    Err(CatalogError::config(format!(
        "invalid instant '{}': expected an ISO-8601 timestamp",
        s
    )))
}
