//! Leaf node.
//!
//! Leaves hold ordered `(key, record id)` entries and form a doubly linked
//! chain in key order through the slotted page's sibling fields.

use crate::common::{Error, PageId, RecordId, Result};

use super::entry::{NodeKind, Payload};
use super::key::{Key, KeyType};
use super::sorted_page::SortedPage;

/// View of a leaf node page.
pub struct LeafPage<B> {
    inner: SortedPage<B>,
}

impl<B: AsRef<[u8]>> LeafPage<B> {
    /// View an existing leaf.
    pub fn open(data: B, key_type: KeyType) -> Result<Self> {
        Ok(Self {
            inner: SortedPage::open(data, key_type, NodeKind::Leaf)?,
        })
    }

    /// Id of the page.
    pub fn page_id(&self) -> PageId {
        self.inner.page_id()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the leaf is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Previous leaf in key order, or `PageId::INVALID`.
    pub fn prev_leaf(&self) -> PageId {
        self.inner.prev()
    }

    /// Next leaf in key order, or `PageId::INVALID`.
    pub fn next_leaf(&self) -> PageId {
        self.inner.next()
    }

    /// Key and record id at `pos`.
    pub fn entry(&self, pos: usize) -> Result<(Key, RecordId)> {
        let entry = self.inner.entry(pos)?;
        match entry.payload {
            Payload::Record(rid) => Ok((entry.key, rid)),
            Payload::Child(_) => Err(Error::MalformedEntry("child payload on leaf")),
        }
    }

    /// Key at `pos`.
    pub fn key_at(&self, pos: usize) -> Result<Key> {
        self.inner.key_at(pos)
    }

    /// Position of the first entry with key `>= key`.
    pub fn lower_bound(&self, key: &Key) -> Result<usize> {
        self.inner.lower_bound(key)
    }

    /// Borrow the underlying sorted page.
    pub fn as_sorted(&self) -> &SortedPage<B> {
        &self.inner
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafPage<B> {
    /// Format `data` as an empty, unlinked leaf.
    pub fn init(data: B, page_id: PageId, key_type: KeyType, capacity: u16) -> Self {
        Self {
            inner: SortedPage::init(data, page_id, key_type, NodeKind::Leaf, capacity),
        }
    }

    /// Insert an entry. `None` if the leaf is full (leaf unchanged).
    pub fn insert_record(&mut self, key: &Key, rid: RecordId) -> Result<Option<usize>> {
        self.inner.insert(key, Payload::Record(rid))
    }

    /// Remove the first entry whose key equals `key`.
    ///
    /// Returns the position it was removed from.
    pub fn delete_key(&mut self, key: &Key) -> Result<Option<usize>> {
        let pos = self.inner.lower_bound(key)?;
        if pos < self.len() && self.key_at(pos)? == *key {
            self.inner.remove(pos);
            return Ok(Some(pos));
        }
        Ok(None)
    }

    /// Remove the first entry whose record id equals `rid`.
    ///
    /// Returns the position it was removed from.
    pub fn delete_record(&mut self, rid: RecordId) -> Result<Option<usize>> {
        for pos in 0..self.len() {
            if self.entry(pos)?.1 == rid {
                self.inner.remove(pos);
                return Ok(Some(pos));
            }
        }
        Ok(None)
    }

    /// Remove the entry at `pos`.
    pub fn remove(&mut self, pos: usize) -> bool {
        self.inner.remove(pos)
    }

    /// Set the previous leaf link.
    pub fn set_prev_leaf(&mut self, page_id: PageId) {
        self.inner.set_prev(page_id);
    }

    /// Set the next leaf link.
    pub fn set_next_leaf(&mut self, page_id: PageId) {
        self.inner.set_next(page_id);
    }

    /// Move entries from `from` onwards to the end of `dest`.
    pub fn move_tail_to<D>(&mut self, from: usize, dest: &mut LeafPage<D>) -> Result<()>
    where
        D: AsRef<[u8]> + AsMut<[u8]>,
    {
        self.inner.move_tail_to(from, &mut dest.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;

    fn rid(slot: u16) -> RecordId {
        RecordId::new(PageId::new(50), slot)
    }

    fn leaf_with(entries: &[(i32, u16)]) -> LeafPage<Vec<u8>> {
        let mut leaf = LeafPage::init(vec![0u8; PAGE_SIZE], PageId::new(4), KeyType::Integer, 0);
        for &(k, s) in entries {
            leaf.insert_record(&Key::Integer(k), rid(s)).unwrap().unwrap();
        }
        leaf
    }

    #[test]
    fn test_fresh_leaf_is_unlinked() {
        let leaf = leaf_with(&[]);
        assert!(leaf.is_empty());
        assert_eq!(leaf.prev_leaf(), PageId::INVALID);
        assert_eq!(leaf.next_leaf(), PageId::INVALID);
    }

    #[test]
    fn test_delete_key_removes_first_match() {
        let mut leaf = leaf_with(&[(10, 0), (20, 1), (20, 2), (30, 3)]);

        assert_eq!(leaf.delete_key(&Key::Integer(20)).unwrap(), Some(1));
        assert_eq!(leaf.entry(1).unwrap(), (Key::Integer(20), rid(2)));
        assert_eq!(leaf.delete_key(&Key::Integer(25)).unwrap(), None);
        assert_eq!(leaf.delete_key(&Key::Integer(99)).unwrap(), None);
        assert_eq!(leaf.len(), 3);
    }

    #[test]
    fn test_delete_record_matches_locator() {
        let mut leaf = leaf_with(&[(10, 0), (20, 1), (30, 2)]);

        assert_eq!(leaf.delete_record(rid(2)).unwrap(), Some(2));
        assert_eq!(leaf.delete_record(rid(9)).unwrap(), None);
        assert_eq!(leaf.len(), 2);
    }

    #[test]
    fn test_sibling_links() {
        let mut leaf = leaf_with(&[]);
        leaf.set_prev_leaf(PageId::new(3));
        leaf.set_next_leaf(PageId::new(5));
        assert_eq!(leaf.prev_leaf(), PageId::new(3));
        assert_eq!(leaf.next_leaf(), PageId::new(5));
    }

    #[test]
    fn test_lower_bound() {
        let leaf = leaf_with(&[(10, 0), (20, 1), (30, 2)]);
        assert_eq!(leaf.lower_bound(&Key::Integer(20)).unwrap(), 1);
        assert_eq!(leaf.lower_bound(&Key::Integer(21)).unwrap(), 2);
        assert_eq!(leaf.lower_bound(&Key::Integer(31)).unwrap(), 3);
    }
}
