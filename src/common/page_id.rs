//! Page identifier type.

use std::fmt;

/// Identifies a page in the database file.
///
/// Using `u32` allows for 4 billion pages. On disk a page id is always
/// stored as 4 little-endian bytes; [`PageId::INVALID`] is the "no page"
/// sentinel written into unused sibling links.
///
/// # Example
/// ```
/// use pagetree::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(PageId::from_le_bytes(page_id.to_le_bytes()), page_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Used to represent "no page", e.g. the end of the leaf chain.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Encoded size in bytes.
    pub const SIZE: usize = 4;

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Encode as little-endian bytes.
    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Decode from little-endian bytes.
    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PageId(u32::from_le_bytes(bytes))
    }

    /// Read a page id stored at `offset` in `data`.
    ///
    /// # Panics
    /// Panics if `data` is shorter than `offset + 4`.
    #[inline]
    pub fn read_from(data: &[u8], offset: usize) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&data[offset..offset + Self::SIZE]);
        Self::from_le_bytes(raw)
    }

    /// Write this page id at `offset` in `data`.
    #[inline]
    pub fn write_to(self, data: &mut [u8], offset: usize) {
        data[offset..offset + Self::SIZE].copy_from_slice(&self.to_le_bytes());
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
