//! Core map type and its builder.

use crate::error::{Error, Result};
use crate::persist::{self, PathKind};
use crate::policy::WritePolicy;
use crate::serializer::{JsonSerializer, Serializer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// String-keyed map of JSON values that mirrors itself to a file.
///
/// With a backing path, every mutation rewrites the whole file before the
/// call returns. Without one it is a plain in-memory map and never does I/O.
/// Use [`open`](Self::open) for a quick start or [`builder`](Self::builder)
/// for replace semantics, seed data, pretty-printing and the write policy.
///
/// Single-owner by design: two maps (or two processes) pointed at the same
/// file will clobber each other.
pub struct PersistentMap {
    entries: Map<String, Value>,
    path: Option<PathBuf>,
    serializer: JsonSerializer,
    policy: WritePolicy,
}

impl PersistentMap {
    /// Empty in-memory map with no backing file.
    pub fn new() -> Self {
        Self::from_entries(std::iter::empty::<(String, Value)>())
    }

    /// In-memory map seeded from `iter`. No I/O ever happens.
    pub fn from_entries<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            entries: collect_entries(iter),
            path: None,
            serializer: JsonSerializer::new(),
            policy: WritePolicy::default(),
        }
    }

    /// Open (or create) a map backed by `path`, loading any existing content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).build()
    }

    /// Start configuring a new map. Call [`.build()`](PersistentMapBuilder::build)
    /// when ready.
    pub fn builder() -> PersistentMapBuilder {
        PersistentMapBuilder::new()
    }

    // ---- reads ----

    /// Borrow the value for `key`.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
    }

    /// Decode the value for `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        T::deserialize(value).map_err(|e| Error::Deserialize(e.to_string()))
    }

    /// `true` if the key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> serde_json::map::Keys<'_> {
        self.entries.keys()
    }

    /// Values in insertion order.
    pub fn values(&self) -> serde_json::map::Values<'_> {
        self.entries.values()
    }

    /// Key-value pairs in insertion order.
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.entries.iter()
    }

    /// The underlying map, exactly as it is written to disk.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Path to the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write policy used for the write-through step.
    #[must_use]
    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    // ---- writes ----

    /// Insert or overwrite `key`, returning the previous value.
    ///
    /// `value` is converted to JSON first, so an unencodable value fails with
    /// [`Error::Serialize`] before memory or disk change. If the file write
    /// fails the map is put back the way it was.
    pub fn set<V: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: V,
    ) -> Result<Option<Value>> {
        let value = serde_json::to_value(value).map_err(|e| Error::Serialize(e.to_string()))?;
        let key = key.into();
        let prev = self.entries.insert(key.clone(), value);
        if let Err(err) = self.write_through() {
            self.log_rollback("set", &err);
            match prev {
                Some(old) => {
                    self.entries.insert(key, old);
                }
                None => {
                    self.entries.shift_remove(&key);
                }
            }
            return Err(err);
        }
        Ok(prev)
    }

    /// Remove `key` and return its value.
    ///
    /// If the file write fails the entry is restored, at the end of the
    /// iteration order.
    pub fn delete(&mut self, key: &str) -> Result<Value> {
        let removed = self
            .entries
            .shift_remove(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))?;
        if let Err(err) = self.write_through() {
            self.log_rollback("delete", &err);
            self.entries.insert(key.to_owned(), removed);
            return Err(err);
        }
        Ok(removed)
    }

    /// Drop all entries.
    pub fn clear(&mut self) -> Result<()> {
        let old = std::mem::take(&mut self.entries);
        if let Err(err) = self.write_through() {
            self.log_rollback("clear", &err);
            self.entries = old;
            return Err(err);
        }
        Ok(())
    }

    /// Bulk insert. Every value is encoded before anything changes, and the
    /// file is written once at the end, not once per entry.
    pub fn extend<I, K, V>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        let batch = iter
            .into_iter()
            .map(|(k, v)| {
                serde_json::to_value(v)
                    .map(|v| (k.into(), v))
                    .map_err(|e| Error::Serialize(e.to_string()))
            })
            .collect::<Result<Vec<(String, Value)>>>()?;
        if batch.is_empty() {
            return Ok(());
        }

        let snapshot = self.path.as_ref().map(|_| self.entries.clone());
        self.entries.extend(batch);
        if let Err(err) = self.write_through() {
            self.log_rollback("extend", &err);
            if let Some(old) = snapshot {
                self.entries = old;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Mutate the value at `key` in place. Returns `false` (and writes
    /// nothing) if the key doesn't exist.
    pub fn update<F>(&mut self, key: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Value),
    {
        let Some(slot) = self.entries.get_mut(key) else {
            return Ok(false);
        };
        let old = slot.clone();
        f(slot);
        if let Err(err) = self.write_through() {
            self.log_rollback("update", &err);
            if let Some(slot) = self.entries.get_mut(key) {
                *slot = old;
            }
            return Err(err);
        }
        Ok(true)
    }

    /// Return the existing value for `key`, or insert `default` and return it.
    pub fn get_or_insert<V: Serialize>(
        &mut self,
        key: impl Into<String>,
        default: V,
    ) -> Result<&Value> {
        let key = key.into();
        if !self.entries.contains_key(&key) {
            self.set(key.clone(), default)?;
        }
        self.get(&key)
    }

    // ---- persistence ----

    /// Rewrite the backing file from memory. No-op for in-memory maps.
    pub fn flush(&self) -> Result<()> {
        self.write_through()
    }

    // ---- internal ----

    fn write_through(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = self.serializer.serialize(&self.entries)?;
        trace!(path = %path.display(), bytes = bytes.len(), "writing backing file");
        persist::write(path, &bytes, self.policy)
    }

    fn log_rollback(&self, op: &'static str, err: &Error) {
        if let Some(path) = &self.path {
            warn!(path = %path.display(), op, error = %err, "write failed, rolling back");
        }
    }
}

impl Default for PersistentMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PersistentMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentMap")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

fn collect_entries<I, K, V>(iter: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// How the entries of a freshly built map came to be.
#[derive(Debug, Clone, Copy)]
enum Origin {
    InMemory,
    Loaded,
    Replaced,
    Created,
}

/// Configures and opens a [`PersistentMap`].
///
/// ```rust,no_run
/// use json_dict::PersistentMap;
///
/// let db = PersistentMap::builder()
///     .path("settings.json")
///     .replace(true)
///     .initial([("theme", "dark")])
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
pub struct PersistentMapBuilder {
    path: Option<PathBuf>,
    replace: bool,
    initial: Map<String, Value>,
    pretty: bool,
    policy: WritePolicy,
}

impl PersistentMapBuilder {
    fn new() -> Self {
        Self {
            path: None,
            replace: false,
            initial: Map::new(),
            pretty: false,
            policy: WritePolicy::default(),
        }
    }

    /// Back the map with the file at `path` (default: in-memory only). An
    /// empty path means no backing file.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.path = (!path.as_os_str().is_empty()).then(|| path.to_path_buf());
        self
    }

    /// Discard whatever the backing file holds and start from the initial
    /// entries instead (default: `false`, load the file).
    pub fn replace(mut self, yes: bool) -> Self {
        self.replace = yes;
        self
    }

    /// Seed entries, used when the backing file is new, when replacing, and
    /// for in-memory maps. Ignored when existing content is loaded.
    pub fn initial<I, K, V>(mut self, iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.initial.extend(collect_entries(iter));
        self
    }

    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Set the write policy (default: [`WritePolicy::Atomic`]).
    pub fn write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load, create or replace the backing file and return the map.
    ///
    /// The initial write for new, empty and replaced stores finishes before
    /// this returns. A path that exists but is not a regular file is rejected
    /// without writing anything.
    pub fn build(self) -> Result<PersistentMap> {
        let serializer = if self.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };

        let (entries, origin) = match &self.path {
            None => (self.initial, Origin::InMemory),
            Some(path) => match persist::inspect(path)? {
                PathKind::Other => return Err(Error::InvalidPath(path.clone())),
                PathKind::File if !self.replace => match persist::load(path, &serializer)? {
                    Some(loaded) => (loaded, Origin::Loaded),
                    None => (self.initial, Origin::Created),
                },
                PathKind::File => (self.initial, Origin::Replaced),
                PathKind::Missing => (self.initial, Origin::Created),
            },
        };

        let map = PersistentMap {
            entries,
            path: self.path,
            serializer,
            policy: self.policy,
        };
        if matches!(origin, Origin::Replaced | Origin::Created) {
            map.write_through()?;
        }
        debug!(path = ?map.path, ?origin, entries = map.len(), "opened persistent map");
        Ok(map)
    }
}

impl std::fmt::Debug for PersistentMapBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentMapBuilder")
            .field("path", &self.path)
            .field("replace", &self.replace)
            .field("initial", &self.initial.len())
            .field("pretty", &self.pretty)
            .field("policy", &self.policy)
            .finish()
    }
}
