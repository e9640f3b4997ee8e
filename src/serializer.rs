//! Serialization layer. Defaults to JSON via serde_json.
//!
//! The on-disk document is always a single JSON object; [`Serializer`] only
//! decides how that object is laid out as bytes.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Converts map snapshots to/from bytes for persistence.
pub trait Serializer: Send + Sync {
    /// Encode the full map to bytes.
    fn serialize(&self, data: &Map<String, Value>) -> Result<Vec<u8>>;

    /// Decode bytes into a JSON value. The caller checks that it is an object.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, data: &Map<String, Value>) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(data)
        } else {
            serde_json::to_vec(data)
        };
        bytes.map_err(Error::from)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes).map_err(Error::from)
    }
}
