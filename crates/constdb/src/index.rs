use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::error::{ConstDbError, Result};
use crate::format::{decode_record, read_footer_pointer, validate_footer_pointer, FOOTER_POINTER_BYTES};
use crate::key::Key;
use crate::source::ByteSource;

/// Location of one value in the data segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    begin: u64,
    end: u64,
    /// Position of the record in the footer table.
    ordinal: u64,
}

/// In-memory key → byte-range mapping, built once when a reader opens.
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<Key, IndexEntry>,
    records_scanned: u64,
}

impl Index {
    /// Reads the footer pointer from `source`, then scans every footer
    /// record between it and the pointer itself.
    ///
    /// With a `filter`, records whose key is not in it are still decoded (to
    /// find where the next record starts) but not kept.
    pub fn build<S: ByteSource + ?Sized>(source: &S, filter: Option<&HashSet<Key>>) -> Result<Self> {
        let len = source.len();
        if len < FOOTER_POINTER_BYTES {
            return Err(ConstDbError::corrupt(format!(
                "file too small for footer pointer ({} bytes)",
                len
            )));
        }
        let pointer_at = len - FOOTER_POINTER_BYTES;
        let ptr = read_footer_pointer(&source.read_range(pointer_at, len)?)?;
        let footer_offset = validate_footer_pointer(ptr, len)?;

        let region = source.read_range(footer_offset, pointer_at)?;
        let mut entries = HashMap::new();
        let mut pos = 0usize;
        let mut ordinal = 0u64;

        while pos < region.len() {
            let (record, used) = decode_record(&region, pos, footer_offset)?;
            pos += used;

            let wanted = filter.map_or(true, |keys| keys.contains(&record.key));
            if wanted {
                match entries.entry(record.key) {
                    Entry::Occupied(e) => {
                        return Err(ConstDbError::corrupt(format!(
                            "key {} appears twice in footer",
                            e.key()
                        )));
                    }
                    Entry::Vacant(v) => {
                        v.insert(IndexEntry {
                            begin: record.begin,
                            end: record.end,
                            ordinal,
                        });
                    }
                }
            }
            ordinal += 1;
        }

        tracing::debug!(
            footer_offset,
            records = ordinal,
            indexed = entries.len(),
            "built constdb index"
        );

        Ok(Self {
            entries,
            records_scanned: ordinal,
        })
    }

    /// Returns the `[begin, end)` range stored for `key`.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<(u64, u64)> {
        self.entries.get(key).map(|e| (e.begin, e.end))
    }

    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of footer records decoded while building, kept or not.
    #[must_use]
    pub fn records_scanned(&self) -> u64 {
        self.records_scanned
    }

    /// Returns `(key, begin, end)` for every indexed key, in insertion order.
    ///
    /// Values are packed in insertion order, so ascending `begin` is
    /// insertion order. Zero-length values can share a `begin` with their
    /// successor; the footer position breaks those ties.
    #[must_use]
    pub fn in_insertion_order(&self) -> Vec<(&Key, u64, u64)> {
        let mut items: Vec<(&Key, &IndexEntry)> = self.entries.iter().collect();
        items.sort_by_key(|(_, e)| (e.begin, e.ordinal));
        items.into_iter().map(|(k, e)| (k, e.begin, e.end)).collect()
    }
}
