use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{ConstDbError, Result};
use crate::index::Index;
use crate::key::Key;
use crate::options::{ReadOptions, ReadStrategy};
use crate::source::{ByteSource, MappedSource, SeekSource};

type BoxedSource = Box<dyn ByteSource + Send + Sync>;

/// Reads a finalized constant database for point lookups.
///
/// On [`open`](ConstDbReader::open) the footer table is scanned once and the
/// key → byte-range index is kept in memory. Lookups never touch the footer
/// again: each [`get`](ConstDbReader::get) is a hash lookup followed by a
/// single range fetch through the selected [`ReadStrategy`].
///
/// Values returned by `get` borrow the reader. With the mapped strategy they
/// are views into the mapping, and [`close`](ConstDbReader::close) takes
/// `&mut self`, so the mapping cannot be released while a view is alive.
pub struct ConstDbReader {
    path: PathBuf,
    strategy: ReadStrategy,
    index: Index,
    /// `None` once closed.
    source: Option<BoxedSource>,
}

impl ConstDbReader {
    /// Opens `path` with the mapped strategy and no key filter.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReadOptions::default())
    }

    /// Opens `path` and builds the index.
    ///
    /// # Errors
    ///
    /// - [`ConstDbError::Io`] if the file cannot be opened or read.
    /// - [`ConstDbError::CorruptFooter`] if the footer pointer lies outside
    ///   the file, a record does not decode within the footer region, or a
    ///   record uses the reserved byte-string key type.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let source: BoxedSource = match options.strategy {
            ReadStrategy::Mapped => Box::new(MappedSource::open(&file)?),
            ReadStrategy::Seek => Box::new(SeekSource::open(file)?),
        };

        let index = Index::build(&*source, options.keys_to_read.as_ref())?;
        tracing::debug!(
            path = %path.display(),
            strategy = ?options.strategy,
            keys = index.len(),
            "opened constdb reader"
        );

        Ok(Self {
            path,
            strategy: options.strategy,
            index,
            source: Some(source),
        })
    }

    fn source(&self) -> Result<&BoxedSource> {
        self.source
            .as_ref()
            .ok_or(ConstDbError::InvalidState("reader is closed"))
    }

    /// Point lookup for a single key.
    ///
    /// Returns `Ok(None)` if the key is not in the index, either because it
    /// was never written or because it was excluded by `keys_to_read`.
    pub fn get<K: Into<Key>>(&self, key: K) -> Result<Option<Cow<'_, [u8]>>> {
        let source = self.source()?;
        match self.index.get(&key.into()) {
            Some((begin, end)) => Ok(Some(source.read_range(begin, end)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](ConstDbReader::get) but always returns an owned copy.
    pub fn get_owned<K: Into<Key>>(&self, key: K) -> Result<Option<Vec<u8>>> {
        Ok(self.get(key)?.map(Cow::into_owned))
    }

    /// Returns the indexed keys in insertion order.
    pub fn keys(&self) -> Result<Vec<Key>> {
        self.source()?;
        Ok(self
            .index
            .in_insertion_order()
            .into_iter()
            .map(|(k, _, _)| k.clone())
            .collect())
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<(&Key, Cow<'_, [u8]>)>> + '_> {
        let source = self.source()?;
        Ok(self
            .index
            .in_insertion_order()
            .into_iter()
            .map(move |(k, begin, end)| source.read_range(begin, end).map(|v| (k, v))))
    }

    /// Returns the `[begin, end)` byte range of `key`'s value.
    pub fn range<K: Into<Key>>(&self, key: K) -> Result<Option<(u64, u64)>> {
        self.source()?;
        Ok(self.index.get(&key.into()))
    }

    pub fn contains_key<K: Into<Key>>(&self, key: K) -> Result<bool> {
        self.source()?;
        Ok(self.index.contains_key(&key.into()))
    }

    /// Number of keys in the index (after filtering).
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of footer records in the file, including filtered-out ones.
    /// `0` after [`close`](ConstDbReader::close).
    #[must_use]
    pub fn records_scanned(&self) -> u64 {
        self.index.records_scanned()
    }

    #[must_use]
    pub fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Unmaps the file or closes the descriptor and drops the index.
    /// Calling it again is a no-op.
    ///
    /// Afterwards every lookup (`get`, `keys`, `iter`, `range`,
    /// `contains_key`) fails with [`ConstDbError::InvalidState`]. The
    /// counters `len`, `is_empty` and `records_scanned` describe the released
    /// index and report `0` / `true` / `0`; use
    /// [`is_closed`](ConstDbReader::is_closed) to query the state.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            self.index = Index::default();
            tracing::debug!(path = %self.path.display(), "closed constdb reader");
        }
    }
}

impl std::fmt::Debug for ConstDbReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstDbReader")
            .field("path", &self.path)
            .field("strategy", &self.strategy)
            .field("keys", &self.index.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
