use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ConstDbError, Result};
use crate::format::{record_len, write_footer_pointer, write_record, FOOTER_POINTER_BYTES};
use crate::key::Key;
use crate::options::WriterOptions;

/// Offsets tracked for one added key until the footer is written.
#[derive(Debug)]
struct PendingEntry {
    key: Key,
    begin: u64,
    end: u64,
}

/// Builds a constant database file.
///
/// Values are appended to the data segment in the order [`add`] is called.
/// [`finalize`] writes one footer record per key (in insertion order)
/// followed by the 8-byte footer pointer, then closes the file.
///
/// # File Layout
///
/// ```text
/// [DATA]    value bytes, concatenated in insertion order
/// [FOOTER]  repeated: type(i32) | begin(i64) | end(i64) | key(i64) or key_len(i64) + key
/// [POINTER] footer_offset(i64)
/// ```
///
/// A writer that is dropped without being finalized finalizes itself, so a
/// database started inside a scope is always left readable when the scope
/// exits, including on early return or panic.
///
/// [`add`]: ConstDbWriter::add
/// [`finalize`]: ConstDbWriter::finalize
pub struct ConstDbWriter {
    path: PathBuf,
    /// `None` once finalized or after a failed data write.
    file: Option<BufWriter<File>>,
    /// A data write failed part-way; the file on disk no longer matches
    /// `current_offset` and must not be finalized.
    failed: bool,
    current_offset: u64,
    entries: Vec<PendingEntry>,
    seen: HashSet<Key>,
    options: WriterOptions,
}

impl ConstDbWriter {
    /// Creates (or truncates) `path` with default [`WriterOptions`].
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_options(path, WriterOptions::default())
    }

    pub fn create_with_options<P: AsRef<Path>>(path: P, options: WriterOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let file = BufWriter::with_capacity(options.buffer_capacity.max(1), raw_file);
        tracing::debug!(path = %path.display(), "created constdb writer");
        Ok(Self {
            path,
            file: Some(file),
            failed: false,
            current_offset: 0,
            entries: Vec::new(),
            seen: HashSet::new(),
            options,
        })
    }

    /// Appends `value` to the data segment under `key`.
    ///
    /// # Errors
    ///
    /// - [`ConstDbError::InvalidState`] if the writer was already finalized
    ///   or an earlier write failed.
    /// - [`ConstDbError::DuplicateKey`] if `key` was added before. Nothing is
    ///   written in that case.
    /// - [`ConstDbError::Io`] on write failure. Part of `value` may already be
    ///   on disk, so the writer is abandoned: later calls fail with
    ///   `InvalidState` and the file is left without a footer.
    pub fn add<K: Into<Key>>(&mut self, key: K, value: &[u8]) -> Result<()> {
        let key = key.into();
        let file = self.file.as_mut().ok_or(if self.failed {
            ConstDbError::InvalidState("add called after a failed write")
        } else {
            ConstDbError::InvalidState("add called after finalize")
        })?;
        if self.seen.contains(&key) {
            return Err(ConstDbError::DuplicateKey(key));
        }

        if let Err(e) = file.write_all(value) {
            self.file = None;
            self.failed = true;
            tracing::warn!(path = %self.path.display(), key = %key, error = %e, "constdb write failed, abandoning file");
            return Err(e.into());
        }
        let begin = self.current_offset;
        self.current_offset += value.len() as u64;

        self.seen.insert(key.clone());
        self.entries.push(PendingEntry {
            key,
            begin,
            end: self.current_offset,
        });
        Ok(())
    }

    /// Writes the footer table and pointer, then closes the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConstDbError::InvalidState`] if called a second time or
    /// after a failed `add`.
    pub fn finalize(&mut self) -> Result<()> {
        if self.failed {
            return Err(ConstDbError::InvalidState("cannot finalize after a failed write"));
        }
        let mut file = self
            .file
            .take()
            .ok_or(ConstDbError::InvalidState("writer already finalized"))?;

        let footer_offset = self.current_offset;
        let mut footer_bytes = 0u64;
        for entry in &self.entries {
            write_record(&mut file, &entry.key, entry.begin, entry.end)?;
            footer_bytes += record_len(&entry.key);
        }
        write_footer_pointer(&mut file, footer_offset)?;

        file.flush()?;
        let raw_file = file.into_inner().map_err(|e| e.into_error())?;
        if self.options.sync_on_finalize {
            raw_file.sync_all()?;
        }

        tracing::debug!(
            path = %self.path.display(),
            keys = self.entries.len(),
            data_bytes = footer_offset,
            file_bytes = footer_offset + footer_bytes + FOOTER_POINTER_BYTES,
            "finalized constdb"
        );

        self.entries.clear();
        self.seen.clear();
        Ok(())
    }

    /// Returns the number of keys added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the current length of the data segment.
    #[must_use]
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.file.is_none() && !self.failed
    }

    /// Returns `true` if a data write failed and the writer was abandoned.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for ConstDbWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstDbWriter")
            .field("path", &self.path)
            .field("keys", &self.entries.len())
            .field("current_offset", &self.current_offset)
            .field("finalized", &self.is_finalized())
            .field("failed", &self.failed)
            .finish()
    }
}

impl Drop for ConstDbWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(e) = self.finalize() {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to finalize constdb on drop");
            }
        }
    }
}

/// Creates a database at `path`, runs `f` against the writer and finalizes it
/// on every exit path.
///
/// If `f` fails, the database is still finalized and `f`'s error is returned.
pub fn write<P, F, T>(path: P, f: F) -> Result<T>
where
    P: AsRef<Path>,
    F: FnOnce(&mut ConstDbWriter) -> Result<T>,
{
    let mut writer = ConstDbWriter::create(path)?;
    let out = f(&mut writer);
    let finalized = if writer.is_finalized() || writer.is_failed() {
        Ok(())
    } else {
        writer.finalize()
    };
    let value = out?;
    finalized?;
    Ok(value)
}
