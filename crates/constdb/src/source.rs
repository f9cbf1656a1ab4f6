//! Byte-fetch strategies.
//!
//! Both sources expose the same [`ByteSource`] interface so that index
//! construction and lookups are written once. They differ only in how a
//! range of bytes is produced: a borrowed view into a read-only mapping, or
//! a freshly allocated buffer filled by a seek + read.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::Mutex;

use memmap2::Mmap;

use crate::error::{ConstDbError, Result};

/// Random access to the bytes of an open database file.
pub trait ByteSource {
    /// Total file length in bytes.
    fn len(&self) -> u64;

    /// Returns the bytes in `[begin, end)`.
    ///
    /// Fails with [`ConstDbError::CorruptFooter`] if the range is inverted or
    /// extends past the end of the file.
    fn read_range(&self, begin: u64, end: u64) -> Result<Cow<'_, [u8]>>;
}

fn check_range(begin: u64, end: u64, len: u64) -> Result<()> {
    if begin > end || end > len {
        return Err(ConstDbError::corrupt(format!(
            "range [{}, {}) outside file of {} bytes",
            begin, end, len
        )));
    }
    Ok(())
}

/// Read-only memory mapping of the whole file.
pub struct MappedSource {
    mmap: Mmap,
}

impl MappedSource {
    pub fn open(file: &File) -> Result<Self> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(ConstDbError::corrupt("empty file has no footer pointer"));
        }
        // SAFETY: the file is finalized and never modified by this crate once
        // readers exist; the mapping is read-only.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap })
    }
}

impl ByteSource for MappedSource {
    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn read_range(&self, begin: u64, end: u64) -> Result<Cow<'_, [u8]>> {
        check_range(begin, end, self.len())?;
        Ok(Cow::Borrowed(&self.mmap[begin as usize..end as usize]))
    }
}

/// Persistent file handle read with positioned reads.
///
/// The handle sits behind a `Mutex` so that lookups work through `&self`.
pub struct SeekSource {
    file: Mutex<BufReader<File>>,
    len: u64,
}

impl SeekSource {
    pub fn open(file: File) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(BufReader::new(file)),
            len,
        })
    }
}

impl ByteSource for SeekSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&self, begin: u64, end: u64) -> Result<Cow<'_, [u8]>> {
        check_range(begin, end, self.len)?;
        let mut buf = vec![0u8; (end - begin) as usize];
        if buf.is_empty() {
            return Ok(Cow::Owned(buf));
        }
        // Every read seeks first, so a poisoned handle is still usable.
        let mut f = self.file.lock().unwrap_or_else(|e| e.into_inner());
        f.seek(SeekFrom::Start(begin))?;
        f.read_exact(&mut buf)?;
        Ok(Cow::Owned(buf))
    }
}
