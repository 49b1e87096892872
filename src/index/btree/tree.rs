//! B+ tree engine.
//!
//! A [`BTreeFile`] is a named, persistent B+ tree living in the database
//! file behind a [`BufferPoolManager`]. The file directory maps the tree's
//! name to its header page; the header records the root and the tree's
//! configuration.
//!
//! ```text
//!                      header ──▶ root (index)
//!                                /     |      \
//!                        (index)    (index)    (index)
//!                        /  \        /  \        /  \
//!                     leaf ⇄ leaf ⇄ leaf ⇄ leaf ⇄ leaf ⇄ leaf
//! ```
//!
//! # Pages and pins
//! The header page stays pinned while the tree is open. Every other page is
//! pinned for as long as one step of an operation needs it and released by
//! its guard, so after any operation returns (successfully or not) only the
//! header remains pinned. Recursion into a child happens after the parent's
//! guard is dropped.
//!
//! # Splits
//! Nodes are split before the overflowing entry is placed, so no page ever
//! holds more than its capacity. Leaf splits copy the new leaf's first key
//! up; index splits push a key up, following the placement rules in
//! [`BTreeFile::insert`].
//!
//! # Failure atomicity
//! There is no logging and no undo. An error in the middle of a split (an
//! I/O failure or a full buffer pool, say) leaves the pages already changed
//! as they are, and the tree may be structurally inconsistent afterwards.
//!
//! # Duplicates
//! Duplicate keys are stored and scanned in insertion order within a leaf.
//! A run of duplicates can straddle a leaf split, in which case routing by
//! key reaches only the right-hand part of the run; [`BTreeFile::delete`]
//! then only sees entries in that leaf. Scans are unaffected.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::buffer::{BufferPoolManager, PinnedPage};
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::Page;

use super::config::BTreeConfig;
use super::entry::{Entry, NodeKind, Payload};
use super::header_page::HeaderPage;
use super::index_page::IndexPage;
use super::key::{Key, KeyType};
use super::leaf_page::LeafPage;
use super::scan::BTreeScan;

/// Entry pushed up from a split child: separator key and the new page.
struct Promotion {
    key: Key,
    page_id: PageId,
}

/// An open B+ tree.
///
/// Mutating operations take `&mut self`; a scan borrows the tree
/// exclusively until it is dropped.
pub struct BTreeFile<'a> {
    bpm: &'a BufferPoolManager,
    name: String,
    header: PinnedPage<'a>,
    config: BTreeConfig,
    root: PageId,
}

impl<'a> BTreeFile<'a> {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open an existing tree by name.
    ///
    /// # Errors
    /// `FileNotFound` if no file entry has this name, `Corrupted` if its
    /// first page is not a tree header.
    pub fn open(bpm: &'a BufferPoolManager, name: &str) -> Result<Self> {
        let header_id = bpm
            .get_file_entry(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        let header = bpm.pin_page(header_id)?;

        let (root, config) = {
            let page = header.read();
            let view = HeaderPage::open(&*page)?;
            (view.root_page_id(), view.config()?)
        };

        debug!(name, header = header_id.0, root = root.0, "opened B+ tree");
        Ok(Self {
            bpm,
            name: name.to_string(),
            header,
            config,
            root,
        })
    }

    /// Create a tree, or open it if a file entry with this name exists.
    ///
    /// A new tree gets a header page and a single empty root leaf. When the
    /// tree already exists `config` is ignored and the stored configuration
    /// is used.
    ///
    /// # Errors
    /// `InvalidConfig` for a rejected configuration; file directory errors
    /// such as `FileNameTooLong`.
    pub fn create(bpm: &'a BufferPoolManager, name: &str, config: BTreeConfig) -> Result<Self> {
        if bpm.get_file_entry(name).is_some() {
            return Self::open(bpm, name);
        }
        config.validate()?;

        let header_id = {
            let mut header_guard = bpm.new_page()?;
            let header_id = header_guard.page_id();

            let mut root_guard = bpm.new_page()?;
            let root_id = root_guard.page_id();
            LeafPage::init(&mut *root_guard, root_id, config.key_type, config.leaf_capacity);
            HeaderPage::init(&mut *header_guard, header_id, root_id, &config);
            header_id
        };
        bpm.add_file_entry(name, header_id)?;

        debug!(name, header = header_id.0, ?config, "created B+ tree");
        Self::open(bpm, name)
    }

    /// Close the tree, releasing its header page.
    pub fn close(self) {
        debug!(name = %self.name, "closed B+ tree");
    }

    /// Close the tree and remove its file entry.
    ///
    /// The tree's pages are not reclaimed.
    pub fn destroy(self) -> Result<()> {
        let bpm = self.bpm;
        let name = self.name.clone();
        drop(self);
        bpm.delete_file_entry(&name)?;
        debug!(name = %name, "destroyed B+ tree");
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Name of the tree's file entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page holding the tree header.
    pub fn header_page_id(&self) -> PageId {
        self.header.page_id()
    }

    /// Current root page.
    pub fn root_page_id(&self) -> PageId {
        self.root
    }

    /// Key domain of the tree.
    pub fn key_type(&self) -> KeyType {
        self.config.key_type
    }

    /// Longest encoded key accepted by [`insert`](Self::insert).
    pub fn max_key_len(&self) -> usize {
        self.config.max_key_len
    }

    /// Configuration the tree was created with.
    pub fn config(&self) -> &BTreeConfig {
        &self.config
    }

    /// Buffer pool the tree runs on.
    pub fn bpm(&self) -> &'a BufferPoolManager {
        self.bpm
    }

    /// Number of levels, 1 for a tree whose root is a leaf.
    pub fn height(&self) -> Result<usize> {
        let mut height = 1;
        let mut page_id = self.root;
        loop {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match self.node_kind(&guard)? {
                NodeKind::Leaf => return Ok(height),
                NodeKind::Index => {
                    page_id = IndexPage::open(&*guard, self.key_type())?.left_link();
                    height += 1;
                }
            }
        }
    }

    /// First leaf of the leaf chain.
    pub fn leftmost_leaf(&self) -> Result<PageId> {
        let mut page_id = self.root;
        loop {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match self.node_kind(&guard)? {
                NodeKind::Leaf => return Ok(page_id),
                NodeKind::Index => {
                    page_id = IndexPage::open(&*guard, self.key_type())?.left_link();
                }
            }
        }
    }

    fn node_kind(&self, page: &Page) -> Result<NodeKind> {
        NodeKind::from_page_type(page.page_type()).ok_or_else(|| Error::Corrupted {
            page_id: page.header().page_id.0,
            reason: format!("expected a tree node, found {:?}", page.page_type()),
        })
    }

    fn check_key_type(&self, key: &Key) -> Result<()> {
        if key.key_type() != self.key_type() {
            return Err(Error::KeyTypeMismatch {
                expected: self.key_type(),
                found: key.key_type(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert `key → rid`.
    ///
    /// Duplicate keys are allowed. Full nodes are split on the way back up:
    ///
    /// - A full node is split at its middle entry, or at the position
    ///   nearest the middle where both halves fit their page when entry
    ///   sizes differ (see [`SortedPage::split_point`]).
    /// - A full leaf moves its entries from the split point on to a new
    ///   leaf linked in right after it, and the new leaf's first key is
    ///   copied up.
    /// - A full index node moves its upper part to a new node. With `L` the
    ///   last key left behind and `R` the first key moved, an incoming key
    ///   below `L` goes left and `L` is pushed up; one at or above `R` goes
    ///   right and `R` is pushed up; one in between is pushed up itself.
    ///   The pushed key's child becomes the new node's left link.
    /// - A split root is replaced by a new index root.
    ///
    /// [`SortedPage::split_point`]: super::sorted_page::SortedPage::split_point
    ///
    /// # Errors
    /// `KeyTooLong` if the encoded key exceeds the maximum key length, then
    /// `KeyTypeMismatch` for a key of the wrong domain. Both are detected
    /// before any page is touched. `NodeFull` if a node has no split point
    /// that fits; this is detected before the node is split.
    pub fn insert(&mut self, key: &Key, rid: RecordId) -> Result<()> {
        if key.encoded_len() > self.config.max_key_len {
            return Err(Error::KeyTooLong {
                len: key.encoded_len(),
                max: self.config.max_key_len,
            });
        }
        self.check_key_type(key)?;

        trace!(%key, %rid, "insert");
        if let Some(up) = self.insert_into(self.root, key, rid)? {
            self.grow_root(up)?;
        }
        Ok(())
    }

    fn insert_into(&self, page_id: PageId, key: &Key, rid: RecordId) -> Result<Option<Promotion>> {
        let child = {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match self.node_kind(&guard)? {
                NodeKind::Leaf => None,
                NodeKind::Index => Some(IndexPage::open(&*guard, self.key_type())?.child_for(key)?),
            }
        };

        match child {
            None => self.insert_into_leaf(page_id, key, rid),
            Some(child) => match self.insert_into(child, key, rid)? {
                None => Ok(None),
                Some(up) => self.insert_into_index(page_id, up),
            },
        }
    }

    fn insert_into_leaf(&self, page_id: PageId, key: &Key, rid: RecordId) -> Result<Option<Promotion>> {
        let key_type = self.key_type();
        let mut guard = self.bpm.fetch_page_write(page_id)?;
        let mut leaf = LeafPage::open(&mut *guard, key_type)?;
        if leaf.insert_record(key, rid)?.is_some() {
            return Ok(None);
        }

        let pos = leaf.as_sorted().upper_bound(key)?;
        let incoming = Entry::encoded_len(key, &Payload::Record(rid));
        let split = leaf
            .as_sorted()
            .split_point(pos, incoming)?
            .ok_or(Error::NodeFull(page_id.0))?;

        let mut new_guard = self.bpm.new_page()?;
        let new_id = new_guard.page_id();
        let mut right = LeafPage::init(&mut *new_guard, new_id, key_type, self.config.leaf_capacity);

        let old_next = leaf.next_leaf();
        right.set_prev_leaf(page_id);
        right.set_next_leaf(old_next);
        leaf.set_next_leaf(new_id);

        leaf.move_tail_to(split, &mut right)?;
        let placed = if pos <= split {
            leaf.insert_record(key, rid)?
        } else {
            right.insert_record(key, rid)?
        };
        if placed.is_none() {
            return Err(Error::NodeFull(page_id.0));
        }
        let up_key = right.key_at(0)?;
        drop(new_guard);
        drop(guard);

        if old_next.is_valid() {
            let mut next_guard = self.bpm.fetch_page_write(old_next)?;
            LeafPage::open(&mut *next_guard, key_type)?.set_prev_leaf(new_id);
        }

        debug!(leaf = page_id.0, new_leaf = new_id.0, separator = %up_key, "split leaf");
        Ok(Some(Promotion {
            key: up_key,
            page_id: new_id,
        }))
    }

    fn insert_into_index(&self, page_id: PageId, up: Promotion) -> Result<Option<Promotion>> {
        let key_type = self.key_type();
        let mut guard = self.bpm.fetch_page_write(page_id)?;
        let mut left = IndexPage::open(&mut *guard, key_type)?;
        if left.insert_key(&up.key, up.page_id)?.is_some() {
            return Ok(None);
        }

        // Equal keys go after existing ones, so a tie with R lands right of the split
        let pos = left.as_sorted().upper_bound(&up.key)?;
        let incoming = Entry::encoded_len(&up.key, &Payload::Child(up.page_id));
        let split = left
            .as_sorted()
            .split_point(pos, incoming)?
            .ok_or(Error::NodeFull(page_id.0))?;

        let mut new_guard = self.bpm.new_page()?;
        let new_id = new_guard.page_id();
        let mut right =
            IndexPage::init(&mut *new_guard, new_id, key_type, self.config.index_capacity);

        left.move_tail_to(split, &mut right)?;

        let pushed = match pos.cmp(&split) {
            Ordering::Less => {
                let last = left.len() - 1;
                let (l_key, l_child) = left.entry(last)?;
                left.remove(last);
                if left.insert_key(&up.key, up.page_id)?.is_none() {
                    return Err(Error::NodeFull(page_id.0));
                }
                right.set_left_link(l_child);
                l_key
            }
            Ordering::Greater => {
                let (r_key, r_child) = right.entry(0)?;
                right.remove(0);
                if right.insert_key(&up.key, up.page_id)?.is_none() {
                    return Err(Error::NodeFull(new_id.0));
                }
                right.set_left_link(r_child);
                r_key
            }
            Ordering::Equal => {
                right.set_left_link(up.page_id);
                up.key
            }
        };

        debug!(node = page_id.0, new_node = new_id.0, separator = %pushed, "split index node");
        Ok(Some(Promotion {
            key: pushed,
            page_id: new_id,
        }))
    }

    fn grow_root(&mut self, up: Promotion) -> Result<()> {
        let old_root = self.root;
        let new_root = {
            let mut guard = self.bpm.new_page()?;
            let new_root = guard.page_id();
            let mut node = IndexPage::init(
                &mut *guard,
                new_root,
                self.key_type(),
                self.config.index_capacity,
            );
            node.set_left_link(old_root);
            if node.insert_key(&up.key, up.page_id)?.is_none() {
                return Err(Error::NodeFull(new_root.0));
            }
            new_root
        };

        HeaderPage::open(&mut *self.header.write())?.set_root_page_id(new_root);
        self.root = new_root;

        debug!(old_root = old_root.0, new_root = new_root.0, "grew new root");
        Ok(())
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Delete one entry for `key`.
    ///
    /// Descends to the leaf that would hold `key` and removes the first
    /// entry there whose key equals it; `rid` is not compared. When the
    /// root is itself a leaf the entry whose record id equals `rid` is
    /// removed instead, whatever its key. Nodes are never merged.
    ///
    /// Returns whether an entry was removed.
    pub fn delete(&mut self, key: &Key, rid: RecordId) -> Result<bool> {
        self.check_key_type(key)?;
        trace!(%key, %rid, "delete");
        Ok(self.remove_entry(key, rid)?.is_some())
    }

    /// Remove an entry, returning the leaf and position it was removed from.
    pub(crate) fn remove_entry(&self, key: &Key, rid: RecordId) -> Result<Option<(PageId, usize)>> {
        let leaf_id = self.find_leaf(key)?;

        let mut guard = self.bpm.fetch_page_write(leaf_id)?;
        let mut leaf = LeafPage::open(&mut *guard, self.key_type())?;
        let removed = if leaf_id == self.root {
            leaf.delete_record(rid)?
        } else {
            leaf.delete_key(key)?
        };
        Ok(removed.map(|pos| (leaf_id, pos)))
    }

    fn find_leaf(&self, key: &Key) -> Result<PageId> {
        let mut page_id = self.root;
        loop {
            let guard = self.bpm.fetch_page_read(page_id)?;
            match self.node_kind(&guard)? {
                NodeKind::Leaf => return Ok(page_id),
                NodeKind::Index => {
                    page_id = IndexPage::open(&*guard, self.key_type())?.child_for(key)?;
                }
            }
        }
    }

    // ========================================================================
    // Scan
    // ========================================================================

    /// Start a range scan over `[low, high]`; either bound may be open.
    ///
    /// The scan starts at the leftmost leaf. Only the leaf the scan is on
    /// stays pinned; the pin moves along the leaf chain and is released
    /// when the scan runs out or is dropped.
    ///
    /// # Errors
    /// `KeyTypeMismatch` if a bound is of the wrong domain.
    pub fn new_scan(&mut self, low: Option<Key>, high: Option<Key>) -> Result<BTreeScan<'_, 'a>> {
        for bound in low.iter().chain(high.iter()) {
            self.check_key_type(bound)?;
        }
        let leaf_id = self.leftmost_leaf()?;
        let leaf = self.bpm.pin_page(leaf_id)?;
        trace!(leaf = leaf_id.0, "new scan");
        Ok(BTreeScan::new(self, leaf, low, high))
    }
}

impl std::fmt::Debug for BTreeFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTreeFile")
            .field("name", &self.name)
            .field("header", &self.header.page_id())
            .field("root", &self.root)
            .field("config", &self.config)
            .finish()
    }
}
