//! Index keys and their on-page encoding.

use std::cmp::Ordering;
use std::fmt;

use crate::common::{Error, Result};

/// Key domain of a B+ tree. Fixed when the tree is created.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Variable-length UTF-8 strings.
    String = 0,
    /// 32-bit signed integers.
    Integer = 1,
}

impl KeyType {
    /// Convert from the on-disk tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(KeyType::String),
            1 => Some(KeyType::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::String => write!(f, "string"),
            KeyType::Integer => write!(f, "integer"),
        }
    }
}

/// A key in a B+ tree.
///
/// Keys of one domain are totally ordered: integers numerically, strings
/// by byte-wise comparison of their UTF-8 form. A tree only ever holds keys
/// of one domain; the derived ordering across domains (integers first) is
/// never relied on.
///
/// # Encoding
/// ```text
/// Integer: [i32 little-endian]                      4 bytes
/// String:  [len: u16 little-endian][UTF-8 bytes]    2 + len bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Integer key.
    Integer(i32),
    /// String key.
    String(String),
}

impl Key {
    /// Domain of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            Key::Integer(_) => KeyType::Integer,
            Key::String(_) => KeyType::String,
        }
    }

    /// Number of bytes this key occupies when encoded.
    ///
    /// This is the length checked against a tree's maximum key length.
    pub fn encoded_len(&self) -> usize {
        match self {
            Key::Integer(_) => 4,
            Key::String(s) => 2 + s.len(),
        }
    }

    /// Append the encoded key to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Key::Integer(v) => out.extend_from_slice(&v.to_le_bytes()),
            Key::String(s) => {
                out.extend_from_slice(&(s.len() as u16).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Decode a key of domain `key_type` from the start of `bytes`.
    ///
    /// Returns the key and the number of bytes consumed.
    pub fn decode(bytes: &[u8], key_type: KeyType) -> Result<(Key, usize)> {
        match key_type {
            KeyType::Integer => {
                let raw: [u8; 4] = bytes
                    .get(..4)
                    .and_then(|b| b.try_into().ok())
                    .ok_or(Error::MalformedEntry("truncated integer key"))?;
                Ok((Key::Integer(i32::from_le_bytes(raw)), 4))
            }
            KeyType::String => {
                let len = bytes
                    .get(..2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]) as usize)
                    .ok_or(Error::MalformedEntry("truncated string key length"))?;
                let body = bytes
                    .get(2..2 + len)
                    .ok_or(Error::MalformedEntry("truncated string key"))?;
                let s = std::str::from_utf8(body)
                    .map_err(|_| Error::MalformedEntry("string key is not UTF-8"))?;
                Ok((Key::String(s.to_string()), 2 + len))
            }
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Integer(a), Key::Integer(b)) => a.cmp(b),
            (Key::String(a), Key::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Key::Integer(_), Key::String(_)) => Ordering::Less,
            (Key::String(_), Key::Integer(_)) => Ordering::Greater,
        }
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Integer(v)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(v) => write!(f, "{}", v),
            Key::String(s) => write!(f, "{:?}", s),
        }
    }
}
