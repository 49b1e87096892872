//! Sorted page - a slotted page whose entries stay in key order.
//!
//! Both node kinds are built on this view. Entries are kept in ascending
//! key order with stable placement of duplicates: a new entry goes after
//! every existing entry with an equal key.

use crate::common::{Error, PageId, Result};
use crate::storage::page::SlottedPage;

use super::entry::{Entry, NodeKind, Payload};
use super::key::{Key, KeyType};

/// Entries of one node kind, sorted by key, on a slotted page.
pub struct SortedPage<B> {
    slots: SlottedPage<B>,
    key_type: KeyType,
    kind: NodeKind,
}

impl<B: AsRef<[u8]>> SortedPage<B> {
    /// View an existing node page.
    ///
    /// # Errors
    /// `Corrupted` if the page is not a node of the expected kind.
    pub fn open(data: B, key_type: KeyType, kind: NodeKind) -> Result<Self> {
        let slots = SlottedPage::new(data);
        if slots.page_type() != kind.page_type() {
            return Err(Error::Corrupted {
                page_id: slots.page_id().0,
                reason: format!("expected a {:?} node, found {:?}", kind, slots.page_type()),
            });
        }
        Ok(Self {
            slots,
            key_type,
            kind,
        })
    }

    /// Id of the page.
    pub fn page_id(&self) -> PageId {
        self.slots.page_id()
    }

    /// Key domain of the entries.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots.slot_count()
    }

    /// Whether the page holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry cap of this page, 0 if only bytes limit it.
    pub fn capacity(&self) -> usize {
        self.slots.slot_limit()
    }

    fn raw(&self, pos: usize) -> Result<&[u8]> {
        self.slots.record(pos).ok_or_else(|| Error::Corrupted {
            page_id: self.page_id().0,
            reason: format!("slot {} out of range", pos),
        })
    }

    /// Decode the entry at `pos`.
    pub fn entry(&self, pos: usize) -> Result<Entry> {
        Entry::from_bytes(self.raw(pos)?, self.key_type, self.kind)
    }

    /// Decode only the key at `pos`.
    pub fn key_at(&self, pos: usize) -> Result<Key> {
        Entry::key_from_bytes(self.raw(pos)?, self.key_type)
    }

    /// All entries in order.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        (0..self.len()).map(|i| self.entry(i)).collect()
    }

    /// Position of the first entry whose key is greater than `key`.
    pub fn upper_bound(&self, key: &Key) -> Result<usize> {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid)? <= *key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Position of the first entry whose key is not less than `key`.
    pub fn lower_bound(&self, key: &Key) -> Result<usize> {
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.key_at(mid)? < *key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    /// Whether an entry with this key and payload would fit.
    pub fn has_room_for(&self, key: &Key, payload: &Payload) -> bool {
        self.slots.has_room(Entry::encoded_len(key, payload))
    }

    /// Where to split this full page so an entry of `incoming` bytes that
    /// belongs at position `pos` fits on one of the halves.
    ///
    /// Positions closest to the middle are tried first. Entries from the
    /// returned position onwards move to the new page. In a leaf the
    /// incoming entry goes left iff `pos <= split`. In an index node an
    /// entry is pushed up as well: the last one left behind if
    /// `pos < split`, the first one moved if `pos > split`, and the
    /// incoming one itself if they are equal.
    ///
    /// Returns `None` if no split position fits both halves.
    pub fn split_point(&self, pos: usize, incoming: usize) -> Result<Option<usize>> {
        let n = self.len();
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0);
        for i in 0..n {
            prefix.push(prefix[i] + self.raw(i)?.len());
        }
        let total = prefix[n];

        let mid = n / 2;
        let candidates = (0..2 * n).map(|step| {
            if step % 2 == 0 {
                mid.checked_add(step / 2)
            } else {
                mid.checked_sub(step / 2 + 1)
            }
        });

        for split in candidates.flatten().filter(|&s| s >= 1 && s < n) {
            let (left, right) = match self.kind {
                NodeKind::Leaf if pos <= split => (
                    (split + 1, prefix[split] + incoming),
                    (n - split, total - prefix[split]),
                ),
                NodeKind::Leaf => (
                    (split, prefix[split]),
                    (n - split + 1, total - prefix[split] + incoming),
                ),
                NodeKind::Index if pos < split => (
                    (split, prefix[split - 1] + incoming),
                    (n - split, total - prefix[split]),
                ),
                NodeKind::Index if pos > split => (
                    (split, prefix[split]),
                    (n - split, total - prefix[split + 1] + incoming),
                ),
                NodeKind::Index => ((split, prefix[split]), (n - split, total - prefix[split])),
            };
            if self.slots.fits(left.0, left.1) && self.slots.fits(right.0, right.1) {
                return Ok(Some(split));
            }
        }
        Ok(None)
    }

    /// Previous sibling link.
    pub fn prev(&self) -> PageId {
        self.slots.prev()
    }

    /// Next sibling link.
    pub fn next(&self) -> PageId {
        self.slots.next()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SortedPage<B> {
    /// Format `data` as an empty node page.
    pub fn init(
        data: B,
        page_id: PageId,
        key_type: KeyType,
        kind: NodeKind,
        capacity: u16,
    ) -> Self {
        let mut slots = SlottedPage::new(data);
        slots.init(page_id, kind.page_type(), capacity);
        Self {
            slots,
            key_type,
            kind,
        }
    }

    /// Insert an entry at its ordered position, after equal keys.
    ///
    /// Returns the position, or `None` if the page is full. A full page is
    /// left unchanged.
    pub fn insert(&mut self, key: &Key, payload: Payload) -> Result<Option<usize>> {
        debug_assert_eq!(payload.kind(), self.kind);
        if !self.has_room_for(key, &payload) {
            return Ok(None);
        }
        let pos = self.upper_bound(key)?;
        let bytes = Entry::encode(key, &payload);
        Ok(self.slots.insert_at(pos, &bytes).then_some(pos))
    }

    /// Remove the entry at `pos`. Returns `false` if out of range.
    pub fn remove(&mut self, pos: usize) -> bool {
        self.slots.delete_at(pos)
    }

    /// Move every entry from `from` onwards to the end of `dest`.
    ///
    /// # Errors
    /// `NodeFull` if `dest` cannot take them; `self` is left intact then,
    /// but `dest` may hold a partial copy.
    pub fn move_tail_to<D>(&mut self, from: usize, dest: &mut SortedPage<D>) -> Result<()>
    where
        D: AsRef<[u8]> + AsMut<[u8]>,
    {
        for pos in from..self.len() {
            let at = dest.len();
            let bytes = self.raw(pos)?;
            if !dest.slots.insert_at(at, bytes) {
                return Err(Error::NodeFull(dest.page_id().0));
            }
        }
        self.slots.truncate(from);
        Ok(())
    }

    /// Set the previous sibling link.
    pub fn set_prev(&mut self, page_id: PageId) {
        self.slots.set_prev(page_id);
    }

    /// Set the next sibling link.
    pub fn set_next(&mut self, page_id: PageId) {
        self.slots.set_next(page_id);
    }
}
