//! Binary format constants and footer record read/write helpers.
//!
//! ## Footer record
//!
//! ```text
//! [type: i32 LE][begin: i64 LE][end: i64 LE]
//!   type == INT_KEY_TYPE:  [key: i64 LE]
//!   type == STR_KEY_TYPE:  [key_len: i64 LE][key bytes (UTF-8)]
//! ```
//!
//! ## Footer pointer (always the last 8 bytes)
//!
//! ```text
//! [footer_offset: i64 LE]
//! ```
//!
//! There is no magic number and no version field. A damaged file is only
//! detected when the pointer or a record decodes outside the footer region.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Result as IoResult, Write};

use crate::error::{ConstDbError, Result};
use crate::key::Key;

/// Type discriminant for integer keys.
pub const INT_KEY_TYPE: i32 = 0;

/// Type discriminant for UTF-8 string keys.
pub const STR_KEY_TYPE: i32 = 1;

/// Reserved discriminant for raw byte keys. Recognised but not supported.
pub const BYTES_KEY_TYPE: i32 = 2;

/// Size of the trailing footer pointer in bytes.
pub const FOOTER_POINTER_BYTES: u64 = 8;

/// Size of the fixed record prefix: 4 (`type`) + 8 (`begin`) + 8 (`end`).
pub const RECORD_HEADER_BYTES: usize = 4 + 8 + 8;

/// A decoded footer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterRecord {
    pub key: Key,
    pub begin: u64,
    pub end: u64,
}

/// Returns the encoded size of the footer record for `key`.
#[must_use]
pub fn record_len(key: &Key) -> u64 {
    let tail = match key {
        Key::Integer(_) => 8,
        Key::Text(s) => 8 + s.len() as u64,
    };
    RECORD_HEADER_BYTES as u64 + tail
}

/// Writes one footer record for `key` covering `[begin, end)`.
pub fn write_record<W: Write>(w: &mut W, key: &Key, begin: u64, end: u64) -> IoResult<()> {
    w.write_i32::<LittleEndian>(key.type_tag())?;
    w.write_i64::<LittleEndian>(begin as i64)?;
    w.write_i64::<LittleEndian>(end as i64)?;
    match key {
        Key::Integer(v) => w.write_i64::<LittleEndian>(*v)?,
        Key::Text(s) => {
            w.write_i64::<LittleEndian>(s.len() as i64)?;
            w.write_all(s.as_bytes())?;
        }
    }
    Ok(())
}

/// Writes the trailing footer pointer.
pub fn write_footer_pointer<W: Write>(w: &mut W, footer_offset: u64) -> IoResult<()> {
    w.write_i64::<LittleEndian>(footer_offset as i64)
}

/// Decodes the footer pointer from the last 8 bytes of the file.
pub fn read_footer_pointer(mut tail: &[u8]) -> Result<i64> {
    if tail.len() != FOOTER_POINTER_BYTES as usize {
        return Err(ConstDbError::corrupt(format!(
            "footer pointer must be {} bytes, got {}",
            FOOTER_POINTER_BYTES,
            tail.len()
        )));
    }
    Ok(tail.read_i64::<LittleEndian>()?)
}

/// Checks that `ptr` lies within `[0, file_len - 8]` and returns it as an
/// unsigned offset.
pub fn validate_footer_pointer(ptr: i64, file_len: u64) -> Result<u64> {
    if file_len < FOOTER_POINTER_BYTES {
        return Err(ConstDbError::corrupt(format!(
            "file too small for footer pointer ({} bytes)",
            file_len
        )));
    }
    let limit = file_len - FOOTER_POINTER_BYTES;
    if ptr < 0 || ptr as u64 > limit {
        return Err(ConstDbError::corrupt(format!(
            "footer pointer {} outside [0, {}]",
            ptr, limit
        )));
    }
    Ok(ptr as u64)
}

/// Decodes the record starting at `pos` within `region`, the in-memory copy
/// of the footer table that begins at absolute offset `footer_offset`.
///
/// Returns the record and the number of bytes it occupies. Value ranges must
/// lie inside the data segment, i.e. end at or before `footer_offset`.
pub fn decode_record(region: &[u8], pos: usize, footer_offset: u64) -> Result<(FooterRecord, usize)> {
    let at = footer_offset + pos as u64;
    let rest = region
        .get(pos..)
        .ok_or_else(|| ConstDbError::corrupt(format!("record cursor {} past footer end", at)))?;
    if rest.len() < RECORD_HEADER_BYTES {
        return Err(ConstDbError::corrupt(format!(
            "truncated record header at offset {} ({} bytes left)",
            at,
            rest.len()
        )));
    }

    let mut r = rest;
    let tag = r.read_i32::<LittleEndian>()?;
    let begin = r.read_i64::<LittleEndian>()?;
    let end = r.read_i64::<LittleEndian>()?;

    if begin < 0 || end < begin || end as u64 > footer_offset {
        return Err(ConstDbError::corrupt(format!(
            "record at offset {} has invalid range [{}, {}) for data segment of {} bytes",
            at, begin, end, footer_offset
        )));
    }

    let key = match tag {
        INT_KEY_TYPE => {
            if r.len() < 8 {
                return Err(ConstDbError::corrupt(format!("truncated integer key at offset {}", at)));
            }
            Key::Integer(r.read_i64::<LittleEndian>()?)
        }
        STR_KEY_TYPE => {
            if r.len() < 8 {
                return Err(ConstDbError::corrupt(format!("truncated key length at offset {}", at)));
            }
            let key_len = r.read_i64::<LittleEndian>()?;
            if key_len < 0 || key_len as u64 > r.len() as u64 {
                return Err(ConstDbError::corrupt(format!(
                    "record at offset {} has key_len {} but only {} bytes remain",
                    at,
                    key_len,
                    r.len()
                )));
            }
            let (bytes, tail) = r.split_at(key_len as usize);
            r = tail;
            let s = std::str::from_utf8(bytes).map_err(|e| {
                ConstDbError::corrupt(format!("record at offset {} has non UTF-8 key: {}", at, e))
            })?;
            Key::Text(s.to_owned())
        }
        BYTES_KEY_TYPE => {
            return Err(ConstDbError::corrupt(format!(
                "record at offset {} uses unsupported byte-string key type {}",
                at, BYTES_KEY_TYPE
            )));
        }
        other => {
            return Err(ConstDbError::corrupt(format!(
                "unknown key type {} at offset {}",
                other, at
            )));
        }
    };

    let consumed = rest.len() - r.len();
    Ok((
        FooterRecord {
            key,
            begin: begin as u64,
            end: end as u64,
        },
        consumed,
    ))
}
