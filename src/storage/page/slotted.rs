//! Slotted page layout.
//!
//! A slotted page stores variable-length records addressed by slot number.
//! The slot directory grows forward from the fixed header while record
//! bytes grow backward from the end of the page:
//!
//! ```text
//! +-------------+--------------+------------------+----------------+
//! | PageHeader  | slotted hdr  | slot directory ->|   free  |<- records |
//! +-------------+--------------+------------------+----------------+
//! 0             9              23
//! ```
//!
//! # Slotted header (14 bytes, after the page header)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 9       2     slot_count
//! 11      2     free_end (start of the record area)
//! 13      4     prev page id
//! 17      4     next page id
//! 21      2     slot_limit (0 = bounded only by free space)
//! ```
//!
//! Each slot is 4 bytes: record offset (u16) and record length (u16).
//!
//! Slots are kept dense. Inserting at a position shifts later slots right
//! and deleting shifts them left, so slot order is whatever order the
//! caller maintains. Deleting compacts the record area immediately, so
//! free space is always contiguous.

use crate::common::config::PAGE_SIZE;
use crate::common::PageId;

use super::page_header::{PageHeader, PageType};

const OFFSET_SLOT_COUNT: usize = PageHeader::SIZE;
const OFFSET_FREE_END: usize = OFFSET_SLOT_COUNT + 2;
const OFFSET_PREV: usize = OFFSET_FREE_END + 2;
const OFFSET_NEXT: usize = OFFSET_PREV + 4;
const OFFSET_SLOT_LIMIT: usize = OFFSET_NEXT + 4;

/// A view over a page buffer that interprets it as a slotted page.
///
/// `B` is any byte buffer: `&[u8]` or a read guard for read-only access,
/// `&mut [u8]` or a write guard when the page is modified.
pub struct SlottedPage<B> {
    data: B,
}

impl<B> SlottedPage<B> {
    /// Offset at which the slot directory starts.
    pub const SLOTS_START: usize = OFFSET_SLOT_LIMIT + 2;

    /// Bytes used by one slot directory entry.
    pub const SLOT_SIZE: usize = 4;

    /// Wrap a buffer. The buffer must be exactly one page.
    ///
    /// # Panics
    /// Panics if the buffer is not `PAGE_SIZE` bytes long.
    pub fn new(data: B) -> Self
    where
        B: AsRef<[u8]>,
    {
        assert_eq!(data.as_ref().len(), PAGE_SIZE, "slotted page must be one page");
        Self { data }
    }

    /// Release the underlying buffer.
    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]>> SlottedPage<B> {
    #[inline]
    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    #[inline]
    fn read_u16(&self, offset: usize) -> u16 {
        let b = self.bytes();
        u16::from_le_bytes([b[offset], b[offset + 1]])
    }

    /// Id stored in the page header.
    pub fn page_id(&self) -> PageId {
        PageId::read_from(self.bytes(), PageHeader::OFFSET_PAGE_ID)
    }

    /// Type stored in the page header.
    pub fn page_type(&self) -> PageType {
        PageType::from_u8(self.bytes()[PageHeader::OFFSET_PAGE_TYPE])
    }

    /// Number of records on the page.
    pub fn slot_count(&self) -> usize {
        self.read_u16(OFFSET_SLOT_COUNT) as usize
    }

    /// Maximum number of slots, or 0 if only free space limits the page.
    pub fn slot_limit(&self) -> usize {
        self.read_u16(OFFSET_SLOT_LIMIT) as usize
    }

    /// Previous page in the sibling chain.
    pub fn prev(&self) -> PageId {
        PageId::read_from(self.bytes(), OFFSET_PREV)
    }

    /// Next page in the sibling chain.
    pub fn next(&self) -> PageId {
        PageId::read_from(self.bytes(), OFFSET_NEXT)
    }

    fn free_end(&self) -> usize {
        self.read_u16(OFFSET_FREE_END) as usize
    }

    fn slots_end(&self) -> usize {
        Self::SLOTS_START + self.slot_count() * Self::SLOT_SIZE
    }

    /// Contiguous bytes between the slot directory and the record area.
    pub fn free_space(&self) -> usize {
        self.free_end().saturating_sub(self.slots_end())
    }

    /// Whether a record of `len` bytes (plus its slot) would fit.
    pub fn has_room(&self, len: usize) -> bool {
        let limit = self.slot_limit();
        if limit != 0 && self.slot_count() >= limit {
            return false;
        }
        self.free_space() >= len + Self::SLOT_SIZE
    }

    /// Whether `count` records totalling `bytes` would fit on this page
    /// once it is emptied.
    pub fn fits(&self, count: usize, bytes: usize) -> bool {
        let limit = self.slot_limit();
        (limit == 0 || count <= limit)
            && Self::SLOTS_START + count * Self::SLOT_SIZE + bytes <= PAGE_SIZE
    }

    fn slot(&self, pos: usize) -> (usize, usize) {
        let at = Self::SLOTS_START + pos * Self::SLOT_SIZE;
        (self.read_u16(at) as usize, self.read_u16(at + 2) as usize)
    }

    /// Record bytes at slot `pos`, or `None` if `pos` is out of range or
    /// the slot points outside the page.
    pub fn record(&self, pos: usize) -> Option<&[u8]> {
        if pos >= self.slot_count() {
            return None;
        }
        let (offset, len) = self.slot(pos);
        self.bytes().get(offset..offset + len)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SlottedPage<B> {
    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut()
    }

    #[inline]
    fn write_u16(&mut self, offset: usize, value: u16) {
        self.bytes_mut()[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Format the page as an empty slotted page.
    ///
    /// Everything after the header is zeroed and both sibling links are
    /// set to [`PageId::INVALID`].
    pub fn init(&mut self, page_id: PageId, page_type: PageType, slot_limit: u16) {
        let data = self.bytes_mut();
        data.fill(0);
        PageHeader::new(page_type, page_id).write_to(data);
        self.write_u16(OFFSET_SLOT_COUNT, 0);
        self.write_u16(OFFSET_FREE_END, PAGE_SIZE as u16);
        self.set_prev(PageId::INVALID);
        self.set_next(PageId::INVALID);
        self.write_u16(OFFSET_SLOT_LIMIT, slot_limit);
    }

    /// Set the previous sibling link.
    pub fn set_prev(&mut self, page_id: PageId) {
        page_id.write_to(self.bytes_mut(), OFFSET_PREV);
    }

    /// Set the next sibling link.
    pub fn set_next(&mut self, page_id: PageId) {
        page_id.write_to(self.bytes_mut(), OFFSET_NEXT);
    }

    fn set_slot(&mut self, pos: usize, offset: usize, len: usize) {
        let at = Self::SLOTS_START + pos * Self::SLOT_SIZE;
        self.write_u16(at, offset as u16);
        self.write_u16(at + 2, len as u16);
    }

    /// Insert `record` so that it becomes slot `pos`.
    ///
    /// Returns `false` (page untouched) if the record does not fit or
    /// `pos > slot_count()`.
    pub fn insert_at(&mut self, pos: usize, record: &[u8]) -> bool {
        let count = self.slot_count();
        if pos > count || !self.has_room(record.len()) {
            return false;
        }

        let offset = self.free_end() - record.len();
        self.bytes_mut()[offset..offset + record.len()].copy_from_slice(record);

        let at = Self::SLOTS_START + pos * Self::SLOT_SIZE;
        let end = Self::SLOTS_START + count * Self::SLOT_SIZE;
        self.bytes_mut().copy_within(at..end, at + Self::SLOT_SIZE);
        self.set_slot(pos, offset, record.len());

        self.write_u16(OFFSET_SLOT_COUNT, (count + 1) as u16);
        self.write_u16(OFFSET_FREE_END, offset as u16);
        true
    }

    /// Remove slot `pos`, compacting the record area.
    ///
    /// Returns `false` if `pos` is out of range.
    pub fn delete_at(&mut self, pos: usize) -> bool {
        let count = self.slot_count();
        if pos >= count {
            return false;
        }

        let (offset, len) = self.slot(pos);
        let free_end = self.free_end();

        // Slide every record stored below the removed one up by `len`.
        self.bytes_mut().copy_within(free_end..offset, free_end + len);
        for i in 0..count {
            let (o, l) = self.slot(i);
            if o < offset {
                self.set_slot(i, o + len, l);
            }
        }

        let at = Self::SLOTS_START + pos * Self::SLOT_SIZE;
        let end = Self::SLOTS_START + count * Self::SLOT_SIZE;
        self.bytes_mut().copy_within(at + Self::SLOT_SIZE..end, at);
        let last = end - Self::SLOT_SIZE;
        self.bytes_mut()[last..end].fill(0);

        self.write_u16(OFFSET_SLOT_COUNT, (count - 1) as u16);
        self.write_u16(OFFSET_FREE_END, (free_end + len) as u16);
        true
    }

    /// Remove every slot from `pos` onwards.
    pub fn truncate(&mut self, pos: usize) {
        while self.slot_count() > pos {
            let last = self.slot_count() - 1;
            self.delete_at(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_page(slot_limit: u16) -> SlottedPage<Vec<u8>> {
        let mut page = SlottedPage::new(vec![0u8; PAGE_SIZE]);
        page.init(PageId::new(5), PageType::BTreeLeaf, slot_limit);
        page
    }

    fn records<B: AsRef<[u8]>>(page: &SlottedPage<B>) -> Vec<Vec<u8>> {
        (0..page.slot_count())
            .map(|i| page.record(i).unwrap().to_vec())
            .collect()
    }

    // --- Format tests ---

    #[test]
    fn test_init_formats_header() {
        let page = empty_page(0);
        assert_eq!(page.page_id(), PageId::new(5));
        assert_eq!(page.page_type(), PageType::BTreeLeaf);
        assert_eq!(page.slot_count(), 0);
        assert_eq!(page.prev(), PageId::INVALID);
        assert_eq!(page.next(), PageId::INVALID);
        assert_eq!(
            page.free_space(),
            PAGE_SIZE - SlottedPage::<Vec<u8>>::SLOTS_START
        );
    }

    #[test]
    fn test_sibling_links() {
        let mut page = empty_page(0);
        page.set_prev(PageId::new(1));
        page.set_next(PageId::new(9));
        assert_eq!(page.prev(), PageId::new(1));
        assert_eq!(page.next(), PageId::new(9));
    }

    // --- Insert tests ---

    #[test]
    fn test_insert_at_positions() {
        let mut page = empty_page(0);
        assert!(page.insert_at(0, b"bbb"));
        assert!(page.insert_at(0, b"a"));
        assert!(page.insert_at(2, b"cc"));
        assert!(page.insert_at(1, b"ab"));

        assert_eq!(
            records(&page),
            vec![b"a".to_vec(), b"ab".to_vec(), b"bbb".to_vec(), b"cc".to_vec()]
        );
        assert!(!page.insert_at(9, b"x"));
    }

    #[test]
    fn test_insert_until_full() {
        let mut page = empty_page(0);
        let record = [7u8; 100];
        let mut inserted = 0;
        while page.insert_at(inserted, &record) {
            inserted += 1;
        }
        // 104 bytes per record in 4073 usable bytes
        assert_eq!(inserted, 39);
        assert!(!page.has_room(100));
        assert!(page.has_room(page.free_space() - SlottedPage::<Vec<u8>>::SLOT_SIZE));
    }

    #[test]
    fn test_slot_limit() {
        let mut page = empty_page(2);
        assert!(page.insert_at(0, b"x"));
        assert!(page.insert_at(1, b"y"));
        assert!(!page.has_room(1));
        assert!(!page.insert_at(2, b"z"));
        assert_eq!(page.slot_count(), 2);
    }

    #[test]
    fn test_fits_matches_inserts() {
        let page = empty_page(0);
        assert!(page.fits(39, 39 * 100));
        assert!(!page.fits(40, 40 * 100));
        assert!(page.fits(1, PAGE_SIZE - SlottedPage::<Vec<u8>>::SLOTS_START - 4));
        assert!(!page.fits(1, PAGE_SIZE - SlottedPage::<Vec<u8>>::SLOTS_START - 3));

        let capped = empty_page(2);
        assert!(capped.fits(2, 10));
        assert!(!capped.fits(3, 3));
    }

    // --- Delete tests ---

    #[test]
    fn test_delete_compacts_records() {
        let mut page = empty_page(0);
        for (i, r) in [b"one".as_ref(), b"two", b"three", b"four"].iter().enumerate() {
            assert!(page.insert_at(i, r));
        }
        let before = page.free_space();

        assert!(page.delete_at(1));
        assert_eq!(
            records(&page),
            vec![b"one".to_vec(), b"three".to_vec(), b"four".to_vec()]
        );
        assert_eq!(page.free_space(), before + 3 + SlottedPage::<Vec<u8>>::SLOT_SIZE);

        assert!(page.delete_at(2));
        assert!(page.delete_at(0));
        assert_eq!(records(&page), vec![b"three".to_vec()]);
        assert!(!page.delete_at(1));
    }

    #[test]
    fn test_delete_then_reinsert_reuses_space() {
        let mut page = empty_page(0);
        let record = [1u8; 200];
        let mut n = 0;
        while page.insert_at(n, &record) {
            n += 1;
        }
        assert!(page.delete_at(n / 2));
        assert!(page.insert_at(0, &record));
        assert_eq!(page.slot_count(), n);
    }

    #[test]
    fn test_truncate() {
        let mut page = empty_page(0);
        for i in 0..6u8 {
            assert!(page.insert_at(i as usize, &[i; 3]));
        }
        page.truncate(2);
        assert_eq!(records(&page), vec![vec![0u8; 3], vec![1u8; 3]]);
        assert_eq!(page.record(2), None);
    }
}
