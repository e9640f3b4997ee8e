//! Write-through JSON-backed map, plus a small spreadsheet export helper.
//!
//! [`PersistentMap`] keeps string keys and JSON values in memory and rewrites
//! its backing file after every mutation, so the file always holds the result
//! of the last successful call.
//!
//! ```rust,no_run
//! use json_dict::PersistentMap;
//!
//! let mut db = PersistentMap::open("db.json").unwrap();
//! db.set("hello", "world").unwrap();
//! assert_eq!(db.get("hello").unwrap(), "world");
//! ```
//!
//! With the `xlsx` feature (on by default), [`xlsx::write_excel`] writes a
//! [`xlsx::Table`] to a spreadsheet with autofit columns and a header filter.
//!
//! **Single-process only.** If multiple processes open the same file they will
//! clobber each other. Use advisory file locking or a real database for
//! multi-process access.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod persist;
pub mod policy;
pub mod serializer;
pub mod store;
#[cfg(feature = "xlsx")]
pub mod xlsx;

pub use error::{Error, Result};
pub use policy::WritePolicy;
pub use store::{PersistentMap, PersistentMapBuilder};
