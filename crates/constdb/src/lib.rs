//! # ConstDB - Constant Database
//!
//! An immutable, write-once/read-many key-value store kept in a single flat
//! file. A [`ConstDbWriter`] appends values and records their byte ranges;
//! once finalized the file can be opened by any number of [`ConstDbReader`]s,
//! each resolving keys to their value with an O(1) hash lookup after an O(n)
//! index build.
//!
//! Keys are either signed 64-bit integers or UTF-8 strings ([`Key`]); values
//! are arbitrary byte strings, including empty ones.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA SEGMENT (value bytes, insertion order, no gaps)          │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER TABLE (one record per key, insertion order)            │
//! │                                                               │
//! │ type (i32) | begin (i64) | end (i64)                          │
//! │   type 0: key (i64)                                           │
//! │   type 1: key_len (i64) | key (UTF-8)                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER POINTER (always last 8 bytes)                          │
//! │                                                               │
//! │ footer_offset (i64 LE)                                        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian and signed.
//!
//! ## Read strategies
//!
//! | Strategy                  | `get` returns            | Cost per `get`          |
//! |---------------------------|--------------------------|-------------------------|
//! | [`ReadStrategy::Mapped`]  | view into the mapping    | slice, no copy          |
//! | [`ReadStrategy::Seek`]    | freshly allocated buffer | seek + read             |
//!
//! Both build the index with the same footer scan and answer every query
//! identically.
//!
//! ## Example
//!
//! ```rust,no_run
//! use constdb::{ReadOptions, ReadStrategy};
//!
//! constdb::write("data.cdb", |db| {
//!     db.add(-2, b"7564")?;
//!     db.add("Hello world", b"67")?;
//!     Ok(())
//! }).unwrap();
//!
//! let db = constdb::read("data.cdb").unwrap();
//! assert_eq!(db.get(-2).unwrap().as_deref(), Some(&b"7564"[..]));
//!
//! let opts = ReadOptions::new().strategy(ReadStrategy::Seek).keys(["Hello world"]);
//! let db = constdb::read_with("data.cdb", opts).unwrap();
//! assert!(db.get(-2).unwrap().is_none());
//! ```

mod error;
mod format;
mod index;
mod key;
mod options;
mod reader;
mod source;
mod writer;

use std::path::Path;

pub use error::{ConstDbError, Result};
pub use format::{
    record_len, BYTES_KEY_TYPE, FOOTER_POINTER_BYTES, INT_KEY_TYPE, RECORD_HEADER_BYTES,
    STR_KEY_TYPE,
};
pub use key::Key;
pub use options::{ReadOptions, ReadStrategy, WriterOptions, DEFAULT_BUFFER_CAPACITY};
pub use reader::ConstDbReader;
pub use writer::{write, ConstDbWriter};

/// Creates (or truncates) a database file at `path`.
pub fn create<P: AsRef<Path>>(path: P) -> Result<ConstDbWriter> {
    ConstDbWriter::create(path)
}

/// Opens a finalized database with the mapped strategy and no key filter.
pub fn read<P: AsRef<Path>>(path: P) -> Result<ConstDbReader> {
    ConstDbReader::open(path)
}

/// Opens a finalized database with explicit [`ReadOptions`].
pub fn read_with<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<ConstDbReader> {
    ConstDbReader::open_with_options(path, options)
}

#[cfg(test)]
mod tests;
