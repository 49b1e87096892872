//! Page header and type definitions.
//!
//! Every page starts with a [`PageHeader`] containing metadata:
//! - [`PageType`] discriminator
//! - CRC32 checksum for integrity
//! - The page's own id, to catch misdirected reads and writes

use crate::common::PageId;

/// Type of page stored on disk.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Unformatted page (freshly allocated, or raw data).
    #[default]
    Invalid = 0,
    /// File directory (always page 0).
    Directory = 1,
    /// B+ tree header page: root id, key type, limits.
    BTreeHeader = 2,
    /// B+ tree internal (index) node.
    BTreeIndex = 3,
    /// B+ tree leaf node.
    BTreeLeaf = 4,
}

impl PageType {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PageType::Directory,
            2 => PageType::BTreeHeader,
            3 => PageType::BTreeIndex,
            4 => PageType::BTreeLeaf,
            _ => PageType::Invalid,
        }
    }

    /// Formatted pages are checksummed on write and verified on read.
    #[inline]
    pub fn is_formatted(self) -> bool {
        self != PageType::Invalid
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (9 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       4     page_id (little-endian)
/// ```
///
/// # Checksum
/// The checksum covers the whole page with the checksum field itself
/// treated as zero. It is stamped by the disk manager when a formatted page
/// is written, so the in-memory copy of a page may carry a stale value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Type of this page.
    pub page_type: PageType,
    /// CRC32 checksum of the page contents.
    pub checksum: u32,
    /// Id of the page this header belongs to.
    pub page_id: PageId,
}

impl Default for PageHeader {
    fn default() -> Self {
        Self::new(PageType::Invalid, PageId::INVALID)
    }
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 9;

    /// Offset of each field within the header.
    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_PAGE_ID: usize = 5;

    /// Create a header for `page_id` with a zero checksum.
    pub fn new(page_type: PageType, page_id: PageId) -> Self {
        Self {
            page_type,
            checksum: 0,
            page_id,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]);

        Self {
            page_type: PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]),
            checksum: u32::from_le_bytes(checksum),
            page_id: PageId::read_from(data, Self::OFFSET_PAGE_ID),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        self.page_id.write_to(data, Self::OFFSET_PAGE_ID);
    }

    /// Compute the CRC32 checksum of a page, skipping the checksum field.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Store the checksum of `page_data` into its own header.
    pub fn stamp_checksum(page_data: &mut [u8]) {
        let checksum = Self::compute_checksum(page_data);
        page_data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());
    }

    /// Verify that the stored checksum matches the computed checksum.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn test_page_type_from_u8() {
        assert_eq!(PageType::from_u8(0), PageType::Invalid);
        assert_eq!(PageType::from_u8(1), PageType::Directory);
        assert_eq!(PageType::from_u8(2), PageType::BTreeHeader);
        assert_eq!(PageType::from_u8(3), PageType::BTreeIndex);
        assert_eq!(PageType::from_u8(4), PageType::BTreeLeaf);
        assert_eq!(PageType::from_u8(255), PageType::Invalid);
        assert!(!PageType::Invalid.is_formatted());
        assert!(PageType::BTreeLeaf.is_formatted());
    }

    #[test]
    fn test_page_header_byte_layout() {
        let header = PageHeader {
            page_type: PageType::BTreeLeaf,
            checksum: 0x04030201,
            page_id: PageId::new(0x08070605),
        };

        let mut buffer = [0u8; PageHeader::SIZE];
        header.write_to(&mut buffer);

        assert_eq!(buffer, [4, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
        assert_eq!(PageHeader::from_bytes(&buffer), header);
    }

    #[test]
    fn test_default_header_has_no_page() {
        let header = PageHeader::default();
        assert_eq!(header.page_type, PageType::Invalid);
        assert_eq!(header.page_id, PageId::INVALID);
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let mut page_data = [0u8; PAGE_SIZE];
        page_data[100] = 0xAB;

        let checksum1 = PageHeader::compute_checksum(&page_data);
        page_data[1..5].copy_from_slice(&[0xFF; 4]);
        let checksum2 = PageHeader::compute_checksum(&page_data);

        assert_eq!(checksum1, checksum2);
    }

    #[test]
    fn test_stamp_then_verify() {
        let mut page_data = [0u8; PAGE_SIZE];
        PageHeader::new(PageType::BTreeIndex, PageId::new(7)).write_to(&mut page_data);
        page_data[2000] = 0x5A;

        PageHeader::stamp_checksum(&mut page_data);
        let header = PageHeader::from_bytes(&page_data);
        assert!(header.verify_checksum(&page_data));

        page_data[2000] = 0x5B;
        assert!(!header.verify_checksum(&page_data));
    }
}
