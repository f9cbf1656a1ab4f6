use std::fmt;

use crate::error::ConstDbError;
use crate::format::{INT_KEY_TYPE, STR_KEY_TYPE};

/// A database key: either a signed 64-bit integer or a UTF-8 string.
///
/// The two variants never compare equal to each other, so `Key::Integer(1)`
/// and `Key::Text("1".into())` are distinct keys in the same database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Integer(i64),
    Text(String),
}

impl Key {
    /// Returns the on-disk type discriminant for this key.
    #[must_use]
    pub fn type_tag(&self) -> i32 {
        match self {
            Key::Integer(_) => INT_KEY_TYPE,
            Key::Text(_) => STR_KEY_TYPE,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Key::Integer(v) => Some(*v),
            Key::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Key::Integer(_) => None,
            Key::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(v) => write!(f, "{}", v),
            Key::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Integer(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Integer(i64::from(v))
    }
}

impl From<u32> for Key {
    fn from(v: u32) -> Self {
        Key::Integer(i64::from(v))
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Text(s.clone())
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

impl TryFrom<u64> for Key {
    type Error = ConstDbError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        i64::try_from(v)
            .map(Key::Integer)
            .map_err(|_| ConstDbError::InvalidKeyType(format!("integer {} does not fit in i64", v)))
    }
}

impl TryFrom<i128> for Key {
    type Error = ConstDbError;

    fn try_from(v: i128) -> Result<Self, Self::Error> {
        i64::try_from(v)
            .map(Key::Integer)
            .map_err(|_| ConstDbError::InvalidKeyType(format!("integer {} does not fit in i64", v)))
    }
}
