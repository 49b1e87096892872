//! Entry codec for B+ tree nodes.
//!
//! An entry is a key followed by its payload. Index nodes store child page
//! ids, leaf nodes store record locators; the node kind decides how the
//! payload bytes are read.
//!
//! ```text
//! Index entry: [key][child page id: u32]
//! Leaf entry:  [key][record id: 6 bytes]
//! ```

use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::PageType;

use super::key::{Key, KeyType};

/// Which kind of node an entry lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Internal node.
    Index,
    /// Leaf node.
    Leaf,
}

impl NodeKind {
    /// Page type tag for nodes of this kind.
    pub fn page_type(self) -> PageType {
        match self {
            NodeKind::Index => PageType::BTreeIndex,
            NodeKind::Leaf => PageType::BTreeLeaf,
        }
    }

    /// Node kind of a page, if it is a tree node at all.
    pub fn from_page_type(page_type: PageType) -> Option<Self> {
        match page_type {
            PageType::BTreeIndex => Some(NodeKind::Index),
            PageType::BTreeLeaf => Some(NodeKind::Leaf),
            _ => None,
        }
    }

    fn payload_len(self) -> usize {
        match self {
            NodeKind::Index => PageId::SIZE,
            NodeKind::Leaf => RecordId::SIZE,
        }
    }
}

/// What an entry's key maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Child page of an index entry.
    Child(PageId),
    /// Record locator of a leaf entry.
    Record(RecordId),
}

impl Payload {
    /// Kind of node this payload belongs on.
    pub fn kind(&self) -> NodeKind {
        match self {
            Payload::Child(_) => NodeKind::Index,
            Payload::Record(_) => NodeKind::Leaf,
        }
    }
}

/// A decoded node entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    pub payload: Payload,
}

impl Entry {
    /// Encoded size of an entry with this key and payload.
    pub fn encoded_len(key: &Key, payload: &Payload) -> usize {
        key.encoded_len() + payload.kind().payload_len()
    }

    /// Encode `key` and `payload` into a fresh buffer.
    pub fn encode(key: &Key, payload: &Payload) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::encoded_len(key, payload));
        key.encode_into(&mut out);
        match payload {
            Payload::Child(page_id) => out.extend_from_slice(&page_id.to_le_bytes()),
            Payload::Record(rid) => out.extend_from_slice(&rid.to_bytes()),
        }
        out
    }

    /// Decode an entry stored on a node of the given kind.
    ///
    /// The payload must end exactly at the end of `bytes`.
    pub fn from_bytes(bytes: &[u8], key_type: KeyType, kind: NodeKind) -> Result<Self> {
        let (key, used) = Key::decode(bytes, key_type)?;
        let rest = &bytes[used..];
        if rest.len() != kind.payload_len() {
            return Err(Error::MalformedEntry("payload length does not match node kind"));
        }
        let payload = match kind {
            NodeKind::Index => Payload::Child(PageId::read_from(rest, 0)),
            NodeKind::Leaf => Payload::Record(
                RecordId::from_bytes(rest).ok_or(Error::MalformedEntry("bad record id"))?,
            ),
        };
        Ok(Self { key, payload })
    }

    /// Decode only the key of an encoded entry.
    pub fn key_from_bytes(bytes: &[u8], key_type: KeyType) -> Result<Key> {
        Key::decode(bytes, key_type).map(|(key, _)| key)
    }
}
