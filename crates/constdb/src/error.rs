//! Error type shared by the writer and the reader.

use std::io;

use thiserror::Error;

use crate::key::Key;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConstDbError>;

/// Errors that can occur while writing or reading a constant database.
#[derive(Debug, Error)]
pub enum ConstDbError {
    /// The key is neither an integer representable as `i64` nor a string.
    #[error("invalid key type: {0}")]
    InvalidKeyType(String),

    /// The key was already added in this writer session.
    #[error("duplicate key: {0}")]
    DuplicateKey(Key),

    /// The operation was invoked after `finalize` / `close`.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The footer pointer or a footer record falls outside valid bounds.
    #[error("corrupt footer: {0}")]
    CorruptFooter(String),
}

impl ConstDbError {
    /// Returns `true` if the error describes a malformed file rather than a
    /// failed operation.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, ConstDbError::CorruptFooter(_))
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        ConstDbError::CorruptFooter(msg.into())
    }
}
