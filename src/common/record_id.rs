//! Record locator type.

use std::fmt;

use super::PageId;

/// Locates a data record outside the index: the page holding it and the
/// slot number on that page.
///
/// Leaf entries of a B+ tree map keys to `RecordId`s. The index never
/// dereferences them.
///
/// # Layout (6 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     page_id (little-endian)
/// 4       2     slot (little-endian)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Page holding the record.
    pub page_id: PageId,
    /// Slot of the record on that page.
    pub slot: u16,
}

impl RecordId {
    /// Encoded size in bytes.
    pub const SIZE: usize = 6;

    /// Create a new record locator.
    #[inline]
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }

    /// Encode into the 6-byte on-page form.
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.page_id.to_le_bytes());
        out[4..].copy_from_slice(&self.slot.to_le_bytes());
        out
    }

    /// Decode from the on-page form. Returns `None` if `bytes` has the
    /// wrong length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        Some(Self {
            page_id: PageId::read_from(bytes, 0),
            slot: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rid({}, {})", self.page_id.0, self.slot)
    }
}
