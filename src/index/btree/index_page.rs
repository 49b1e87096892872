//! Index (internal) node.
//!
//! An index node holds a left link plus ordered `(separator, child)`
//! entries. Keys below the first separator live under the left link; keys
//! `k` with `k_i <= k < k_{i+1}` live under child `c_i`.
//!
//! The left link is stored in the slotted page's "previous" field. Index
//! nodes have no sibling chain.

use crate::common::{Error, PageId, Result};

use super::entry::{NodeKind, Payload};
use super::key::{Key, KeyType};
use super::sorted_page::SortedPage;

/// View of an index node page.
pub struct IndexPage<B> {
    inner: SortedPage<B>,
}

impl<B: AsRef<[u8]>> IndexPage<B> {
    /// View an existing index node.
    pub fn open(data: B, key_type: KeyType) -> Result<Self> {
        Ok(Self {
            inner: SortedPage::open(data, key_type, NodeKind::Index)?,
        })
    }

    /// Id of the page.
    pub fn page_id(&self) -> PageId {
        self.inner.page_id()
    }

    /// Number of separator entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the node has no separators.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Child for keys below the first separator.
    pub fn left_link(&self) -> PageId {
        self.inner.prev()
    }

    /// Separator and child at `pos`.
    pub fn entry(&self, pos: usize) -> Result<(Key, PageId)> {
        let entry = self.inner.entry(pos)?;
        match entry.payload {
            Payload::Child(child) => Ok((entry.key, child)),
            Payload::Record(_) => Err(Error::MalformedEntry("record payload on index node")),
        }
    }

    /// Separator key at `pos`.
    pub fn key_at(&self, pos: usize) -> Result<Key> {
        self.inner.key_at(pos)
    }

    /// Child page that holds `key`.
    ///
    /// The left link if `key` sorts before the first separator, otherwise
    /// the child of the last separator `<= key`.
    pub fn child_for(&self, key: &Key) -> Result<PageId> {
        match self.inner.upper_bound(key)? {
            0 => Ok(self.left_link()),
            p => self.entry(p - 1).map(|(_, child)| child),
        }
    }

    /// Borrow the underlying sorted page.
    pub fn as_sorted(&self) -> &SortedPage<B> {
        &self.inner
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> IndexPage<B> {
    /// Format `data` as an empty index node.
    pub fn init(data: B, page_id: PageId, key_type: KeyType, capacity: u16) -> Self {
        Self {
            inner: SortedPage::init(data, page_id, key_type, NodeKind::Index, capacity),
        }
    }

    /// Set the child for keys below the first separator.
    pub fn set_left_link(&mut self, page_id: PageId) {
        self.inner.set_prev(page_id);
    }

    /// Insert a separator. `None` if the node is full (node unchanged).
    pub fn insert_key(&mut self, key: &Key, child: PageId) -> Result<Option<usize>> {
        self.inner.insert(key, Payload::Child(child))
    }

    /// Remove the separator at `pos`.
    pub fn remove(&mut self, pos: usize) -> bool {
        self.inner.remove(pos)
    }

    /// Move separators from `from` onwards to the end of `dest`.
    pub fn move_tail_to<D>(&mut self, from: usize, dest: &mut IndexPage<D>) -> Result<()>
    where
        D: AsRef<[u8]> + AsMut<[u8]>,
    {
        self.inner.move_tail_to(from, &mut dest.inner)
    }
}
