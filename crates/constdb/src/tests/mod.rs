mod format_tests;

use crate::*;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Writes the five-entry sample database used across the reader tests.
pub(crate) fn write_sample(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut db = create(&path)?;
    db.add(-2, b"7564")?;
    db.add(3, b"23")?;
    db.add(-1, b"66")?;
    db.add("Hello world", b"67")?;
    db.add(6, b"26")?;
    db.finalize()?;
    Ok(path)
}

/// The keys of [`write_sample`], in insertion order.
pub(crate) fn sample_keys() -> Vec<Key> {
    vec![
        Key::Integer(-2),
        Key::Integer(3),
        Key::Integer(-1),
        Key::Text("Hello world".into()),
        Key::Integer(6),
    ]
}
