//! Disk I/O helpers: path inspection, load-and-validate, and file writes.
//!
//! The rename-over approach used by [`WritePolicy::Atomic`] is close to atomic
//! on most platforms. On FAT32 or network shares there are no hard guarantees.

use crate::error::{Error, Result};
use crate::policy::WritePolicy;
use crate::serializer::Serializer;
use serde_json::{Map, Value};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// What currently sits at a backing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Nothing exists at the path.
    Missing,
    /// A regular file (symlinks are followed).
    File,
    /// Something else: a directory, socket, device, ...
    Other,
}

/// Classify `path` without touching its contents.
pub fn inspect(path: &Path) -> Result<PathKind> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(PathKind::File),
        Ok(_) => Ok(PathKind::Other),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(PathKind::Missing),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Reads and decodes the file at `path`. The document must be a JSON object.
/// Returns `None` for a zero-length file, which holds no document yet.
pub fn load<S: Serializer>(path: &Path, serializer: &S) -> Result<Option<Map<String, Value>>> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    match serializer.deserialize(&bytes)? {
        Value::Object(map) => Ok(Some(map)),
        other => Err(Error::MalformedStore {
            path: path.to_path_buf(),
            found: json_kind(&other),
        }),
    }
}

/// Replace the contents of `path` with `bytes` according to `policy`.
pub fn write(path: &Path, bytes: &[u8], policy: WritePolicy) -> Result<()> {
    match policy {
        WritePolicy::Atomic => atomic_write(path, bytes),
        WritePolicy::InPlace => std::fs::write(path, bytes).map_err(Error::Io),
    }
}

/// Write `bytes` to a temp file in the target's directory and then rename it
/// over `path`. This avoids leaving a half-written file if the process crashes
/// mid-write.
///
/// Symlinks are resolved first so the rename replaces the real file, not the
/// link, and the existing file's permissions carry over to the new one.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let target = match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(Error::Io(e)),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    match std::fs::metadata(&target) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::Io(e)),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Human-readable name of a JSON value's kind.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
