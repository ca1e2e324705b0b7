use thiserror::Error;

use crate::layer::LayerId;

/// Errors raised by a backend client while reading bytes.
///
/// Adapters produce these; the catalog layer wraps them with the layer/key
/// context of the operation that failed.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Local or mounted filesystem error
    #[error("I/O error: {0}")]
    Io(String),

    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// HTTP transport error (WebHDFS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Error reported by a cluster store client
    #[error("cluster error: {0}")]
    Cluster(String),

    /// Object, file or row not found
    #[error("not found: {0}")]
    NotFound(String),
}

impl BackendError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            BackendError::NotFound(err.to_string())
        } else {
            BackendError::Io(err.to_string())
        }
    }
}

/// Errors decoding a tile or stored record payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Payload ended before a field could be read
    #[error("truncated payload: needed {needed} bytes for {field}, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// Payload does not start with the expected magic bytes
    #[error("invalid magic bytes: expected {expected:?}, got {found:?}")]
    InvalidMagic { expected: [u8; 4], found: [u8; 4] },

    /// Unsupported format version
    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),

    /// Unknown tag byte for a field
    #[error("unknown {field} tag {tag}")]
    UnknownTag { field: &'static str, tag: u8 },

    /// Cell type and no-data combination is not representable
    #[error("invalid cell type: {0}")]
    InvalidCellType(String),

    /// Band payload length disagrees with its dimensions and cell type
    #[error("band payload is {actual} bytes, expected {expected} for {cols}x{rows} {cell_type}")]
    LengthMismatch {
        cell_type: String,
        cols: u32,
        rows: u32,
        expected: usize,
        actual: usize,
    },

    /// Band dimensions describe more cells than memory can address
    #[error("band of {cols}x{rows} {cell_type} is too large")]
    TooLarge {
        cell_type: String,
        cols: u32,
        rows: u32,
    },

    /// A multiband tile must have at least one band
    #[error("multiband tile has no bands")]
    NoBands,

    /// Bands of one tile disagree on dimensions
    #[error("band {index} is {cols}x{rows}, expected {expected_cols}x{expected_rows}")]
    DimensionMismatch {
        index: usize,
        cols: u32,
        rows: u32,
        expected_cols: u32,
        expected_rows: u32,
    },

    /// Stored record holds different key/value types than requested
    #[error("record holds {found}, requested {expected}")]
    RecordType { expected: String, found: String },

    /// Bytes left over after the last field
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// Errors surfaced by attribute stores, value readers and the factory.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Layer, attribute or key does not exist in the backend
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Requested key/value types disagree with what the layer stores
    #[error("type mismatch for layer {layer}: requested {expected}, stored {found}")]
    TypeMismatch {
        layer: LayerId,
        expected: String,
        found: String,
    },

    /// Missing required configuration or malformed request parameter
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend client failure, with the operation that triggered it
    #[error("backend error while {context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: BackendError,
    },

    /// A stored attribute could not be interpreted
    #[error("invalid attribute {attribute} for layer {layer}: {reason}")]
    InvalidAttribute {
        layer: LayerId,
        attribute: String,
        reason: String,
    },

    /// Corrupt tile or record payload
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CatalogError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a backend error, turning backend not-found into `NotFound`.
    pub fn backend(context: impl Into<String>, source: BackendError) -> Self {
        let context = context.into();
        match source {
            BackendError::NotFound(_) => Self::NotFound { what: context },
            source => Self::Backend { context, source },
        }
    }

    /// Prefix the tile lookup that failed to a `NotFound` or `Backend` error.
    pub fn in_lookup(self, lookup: &str) -> Self {
        match self {
            Self::NotFound { what } => Self::NotFound {
                what: format!("{}: {}", lookup, what),
            },
            Self::Backend { context, source } => Self::Backend {
                context: format!("{}: {}", lookup, context),
                source,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CatalogError::TypeMismatch { .. })
    }

    pub fn is_config(&self) -> bool {
        matches!(self, CatalogError::Config(_))
    }
}

/// Result type for catalog operations.
pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
