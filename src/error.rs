//! Unified error type for all store and export operations.

use std::path::PathBuf;

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system problem (read, write, rename). Carries the original error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The backing path exists but is not a regular file.
    #[error("backing path '{}' exists, but is not a file", .0.display())]
    InvalidPath(PathBuf),
    /// The backing file parsed as JSON, but its top-level value is not an object.
    #[error("backing store '{}' does not contain a JSON object (found {found})", .path.display())]
    MalformedStore {
        /// Path of the offending file.
        path: PathBuf,
        /// Kind of JSON value found at the top level.
        found: &'static str,
    },
    /// A value could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialize(String),
    /// Bytes on disk (or a stored value) could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialize(String),
    /// Read or delete of a key that is not in the map.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),
    /// Spreadsheet writer failure other than plain I/O.
    #[error("xlsx error: {0}")]
    Xlsx(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.into())
        } else if err.is_syntax() || err.is_eof() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Serialize(err.to_string())
        }
    }
}

#[cfg(feature = "xlsx")]
impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        match err {
            rust_xlsxwriter::XlsxError::IoError(io) => Error::Io(io),
            other => Error::Xlsx(other.to_string()),
        }
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
