use std::collections::HashSet;

use crate::key::Key;

/// Default capacity of the writer's `BufWriter` (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Settings for [`ConstDbWriter`](crate::ConstDbWriter).
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Call `sync_all()` on the file once the footer has been written.
    pub sync_on_finalize: bool,
    /// Capacity of the write buffer in front of the file.
    pub buffer_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            sync_on_finalize: true,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// How a reader fetches value bytes once the index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStrategy {
    /// Map the whole file read-only; `get` returns views into the mapping.
    #[default]
    Mapped,
    /// Seek and read into a fresh buffer on every `get`.
    Seek,
}

/// Settings for [`ConstDbReader`](crate::ConstDbReader).
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub strategy: ReadStrategy,
    /// When set, only these keys are inserted into the index.
    pub keys_to_read: Option<HashSet<Key>>,
}

impl ReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn strategy(mut self, strategy: ReadStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Restricts the index to `keys`.
    #[must_use]
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.keys_to_read = Some(keys.into_iter().map(Into::into).collect());
        self
    }
}
