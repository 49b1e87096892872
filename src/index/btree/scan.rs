//! Range scans over a B+ tree.
//!
//! A scan walks the leaf chain from the leftmost leaf, skipping entries
//! below the low bound and stopping at the first entry above the high
//! bound. Either bound may be open, which gives five kinds of scan:
//!
//! | low     | high    | returns                  |
//! |---------|---------|--------------------------|
//! | none    | none    | every entry              |
//! | none    | `h`     | keys `<= h`              |
//! | `l`     | none    | keys `>= l`              |
//! | `k`     | `k`     | every entry with key `k` |
//! | `l`     | `h`     | keys in `[l, h]`         |
//!
//! The leaf the scan is positioned on stays pinned (but not latched) until
//! the scan moves off it, runs out, or is dropped.

use crate::buffer::PinnedPage;
use crate::common::{Error, PageId, RecordId, Result};

use super::key::Key;
use super::leaf_page::LeafPage;
use super::tree::BTreeFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    NotStarted,
    Active,
    Exhausted,
}

/// What one look at the current leaf found.
enum Step {
    Entry(Key, RecordId),
    NextLeaf(PageId),
    End,
}

/// Cursor over the entries of a [`BTreeFile`] in key order.
///
/// Created by [`BTreeFile::new_scan`]. Holds the tree exclusively, so the
/// only way to modify the tree during a scan is
/// [`delete_current`](Self::delete_current).
///
/// # Example
/// ```no_run
/// use pagetree::{BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Key};
///
/// let dm = DiskManager::open_or_create("index.db").unwrap();
/// let bpm = BufferPoolManager::new(64, dm);
/// let mut tree = BTreeFile::create(&bpm, "ages", BTreeConfig::default()).unwrap();
///
/// for entry in tree.new_scan(Some(Key::from(18)), Some(Key::from(65))).unwrap() {
///     let (key, rid) = entry.unwrap();
///     println!("{} -> {}", key, rid);
/// }
/// ```
pub struct BTreeScan<'t, 'a> {
    tree: &'t mut BTreeFile<'a>,
    leaf: Option<PinnedPage<'a>>,
    /// Position in `leaf` of the next entry to look at.
    slot: usize,
    low: Option<Key>,
    high: Option<Key>,
    /// Set once an entry `>= low` has been seen; later entries need no
    /// low-bound check.
    past_low: bool,
    state: ScanState,
    /// Last entry returned, while it may still be deleted.
    current: Option<(Key, RecordId)>,
    just_deleted: bool,
}

impl<'t, 'a> BTreeScan<'t, 'a> {
    pub(crate) fn new(
        tree: &'t mut BTreeFile<'a>,
        leaf: PinnedPage<'a>,
        low: Option<Key>,
        high: Option<Key>,
    ) -> Self {
        Self {
            tree,
            leaf: Some(leaf),
            slot: 0,
            past_low: low.is_none(),
            low,
            high,
            state: ScanState::NotStarted,
            current: None,
            just_deleted: false,
        }
    }

    /// Longest encoded key the scanned tree accepts.
    pub fn key_size_limit(&self) -> usize {
        self.tree.max_key_len()
    }

    /// Whether the scan has run out of entries.
    pub fn is_exhausted(&self) -> bool {
        self.state == ScanState::Exhausted
    }

    /// Page the scan is positioned on, if it still holds one.
    pub fn current_leaf(&self) -> Option<PageId> {
        self.leaf.as_ref().map(PinnedPage::page_id)
    }

    /// Return the next entry in range, or `None` once the scan is done.
    ///
    /// Empty leaves are skipped. Reaching the end of the leaf chain or an
    /// entry above the high bound ends the scan and releases its leaf.
    /// An error also ends the scan.
    pub fn get_next(&mut self) -> Result<Option<(Key, RecordId)>> {
        if self.state == ScanState::Exhausted {
            return Ok(None);
        }
        self.state = ScanState::Active;
        self.just_deleted = false;
        self.current = None;

        match self.advance() {
            Ok(Some((key, rid))) => {
                self.current = Some((key.clone(), rid));
                Ok(Some((key, rid)))
            }
            Ok(None) => {
                self.finish();
                Ok(None)
            }
            Err(e) => {
                self.finish();
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<(Key, RecordId)>> {
        loop {
            let step = {
                let Some(leaf) = &self.leaf else {
                    return Ok(None);
                };
                let page = leaf.read();
                let view = LeafPage::open(&*page, self.tree.key_type())?;

                if !self.past_low {
                    if let Some(low) = &self.low {
                        self.slot = self.slot.max(view.lower_bound(low)?);
                    }
                }
                if self.slot < view.len() {
                    let (key, rid) = view.entry(self.slot)?;
                    Step::Entry(key, rid)
                } else if view.next_leaf().is_valid() {
                    Step::NextLeaf(view.next_leaf())
                } else {
                    Step::End
                }
            };

            match step {
                Step::Entry(key, rid) => {
                    if self.high.as_ref().is_some_and(|high| key > *high) {
                        return Ok(None);
                    }
                    self.past_low = true;
                    self.slot += 1;
                    return Ok(Some((key, rid)));
                }
                Step::NextLeaf(next) => {
                    let pinned = self.tree.bpm().pin_page(next)?;
                    self.leaf = Some(pinned);
                    self.slot = 0;
                }
                Step::End => return Ok(None),
            }
        }
    }

    fn finish(&mut self) {
        self.state = ScanState::Exhausted;
        self.leaf = None;
        self.current = None;
    }

    /// Delete the entry most recently returned by [`get_next`](Self::get_next).
    ///
    /// The deletion goes through [`BTreeFile::delete`] with the returned key
    /// and record id. The following call to `get_next` returns the entry
    /// after the deleted one.
    ///
    /// In a tree with more than one level the removal matches by key only,
    /// so when the current key has duplicates in the same leaf the first
    /// of them is removed, which may be an entry returned earlier rather
    /// than the current one. A single-leaf root matches the record id
    /// instead, as in [`BTreeFile::delete`].
    ///
    /// # Errors
    /// `IteratorMisuse` if nothing has been returned yet, the scan is over,
    /// or the current entry was already deleted.
    pub fn delete_current(&mut self) -> Result<()> {
        if self.state != ScanState::Active || self.just_deleted {
            return Err(Error::IteratorMisuse);
        }
        let (key, rid) = self.current.take().ok_or(Error::IteratorMisuse)?;

        let removed = self.tree.remove_entry(&key, rid)?;
        if let (Some((page_id, pos)), Some(leaf)) = (removed, &self.leaf) {
            if page_id == leaf.page_id() && pos < self.slot {
                self.slot -= 1;
            }
        }
        self.just_deleted = true;
        Ok(())
    }
}

impl Iterator for BTreeScan<'_, '_> {
    type Item = Result<(Key, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_next().transpose()
    }
}

impl std::fmt::Debug for BTreeScan<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTreeScan")
            .field("leaf", &self.current_leaf())
            .field("slot", &self.slot)
            .field("low", &self.low)
            .field("high", &self.high)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferPoolManager;
    use crate::index::btree::{BTreeConfig, KeyType};
    use crate::storage::DiskManager;
    use tempfile::tempdir;

    fn create_test_bpm(pool_size: usize) -> (BufferPoolManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let dm = DiskManager::create(&path).unwrap();
        (BufferPoolManager::new(pool_size, dm), dir)
    }

    fn rid(n: i32) -> RecordId {
        RecordId::new(PageId::new(500), n as u16)
    }

    fn small_config() -> BTreeConfig {
        BTreeConfig::new(KeyType::Integer)
            .with_leaf_capacity(3)
            .with_index_capacity(3)
    }

    fn keys(scan: BTreeScan<'_, '_>) -> Vec<i32> {
        scan.map(|r| match r.unwrap().0 {
            Key::Integer(v) => v,
            Key::String(_) => unreachable!(),
        })
        .collect()
    }

    fn filled(bpm: &BufferPoolManager, ks: impl IntoIterator<Item = i32>) -> BTreeFile<'_> {
        let mut tree = BTreeFile::create(bpm, "idx", small_config()).unwrap();
        for k in ks {
            tree.insert(&Key::Integer(k), rid(k)).unwrap();
        }
        tree
    }

    // --- Boundary tests ---

    #[test]
    fn test_open_bounds() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, (0..20).map(|k| k * 5));

        let all = keys(tree.new_scan(None, None).unwrap());
        assert_eq!(all, (0..20).map(|k| k * 5).collect::<Vec<_>>());

        let upto = keys(tree.new_scan(None, Some(Key::Integer(22))).unwrap());
        assert_eq!(upto, vec![0, 5, 10, 15, 20]);

        let from = keys(tree.new_scan(Some(Key::Integer(81)), None).unwrap());
        assert_eq!(from, vec![85, 90, 95]);
    }

    #[test]
    fn test_closed_bounds() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, (0..20).map(|k| k * 5));

        let range = keys(tree.new_scan(Some(Key::Integer(30)), Some(Key::Integer(50))).unwrap());
        assert_eq!(range, vec![30, 35, 40, 45, 50]);

        let exact = keys(tree.new_scan(Some(Key::Integer(45)), Some(Key::Integer(45))).unwrap());
        assert_eq!(exact, vec![45]);

        let missing = keys(tree.new_scan(Some(Key::Integer(46)), Some(Key::Integer(46))).unwrap());
        assert!(missing.is_empty());

        let inverted = keys(tree.new_scan(Some(Key::Integer(60)), Some(Key::Integer(10))).unwrap());
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_exact_match_returns_all_duplicates() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = BTreeFile::create(&bpm, "idx", small_config()).unwrap();
        for (i, k) in [1, 7, 7, 3, 7, 9, 7, 7].iter().enumerate() {
            tree.insert(&Key::Integer(*k), rid(i as i32)).unwrap();
        }

        let rids: Vec<u16> = tree
            .new_scan(Some(Key::Integer(7)), Some(Key::Integer(7)))
            .unwrap()
            .map(|r| r.unwrap().1.slot)
            .collect();
        assert_eq!(rids.len(), 5);
    }

    #[test]
    fn test_empty_tree_and_empty_leaves() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, 0..0);
        let mut scan = tree.new_scan(None, None).unwrap();
        assert_eq!(scan.get_next().unwrap(), None);
        assert!(scan.is_exhausted());
        assert_eq!(scan.current_leaf(), None);
        drop(scan);

        // Empty out the first leaves; the scan walks past them
        for k in 0..9 {
            tree.insert(&Key::Integer(k), rid(k)).unwrap();
        }
        for k in 0..6 {
            assert!(tree.delete(&Key::Integer(k), rid(k)).unwrap());
        }
        assert_eq!(keys(tree.new_scan(None, None).unwrap()), vec![6, 7, 8]);
    }

    // --- Cursor state tests ---

    #[test]
    fn test_exhausted_scan_stays_done() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, [1, 2]);
        let mut scan = tree.new_scan(None, None).unwrap();

        assert!(scan.get_next().unwrap().is_some());
        assert!(scan.get_next().unwrap().is_some());
        assert_eq!(scan.get_next().unwrap(), None);
        assert_eq!(scan.get_next().unwrap(), None);
        assert!(matches!(scan.delete_current(), Err(Error::IteratorMisuse)));
    }

    #[test]
    fn test_scan_pins_one_leaf() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, 0..30);
        assert_eq!(bpm.pinned_frame_count(), 1);

        let mut scan = tree.new_scan(Some(Key::Integer(10)), Some(Key::Integer(12))).unwrap();
        assert_eq!(bpm.pinned_frame_count(), 2);
        while scan.get_next().unwrap().is_some() {
            assert_eq!(bpm.pinned_frame_count(), 2);
        }
        // Stopping at the high bound releases the leaf
        assert_eq!(bpm.pinned_frame_count(), 1);
        drop(scan);

        let scan = tree.new_scan(None, None).unwrap();
        assert_eq!(bpm.pinned_frame_count(), 2);
        drop(scan);
        assert_eq!(bpm.pinned_frame_count(), 1);
    }

    #[test]
    fn test_key_size_limit() {
        let (bpm, _dir) = create_test_bpm(16);
        let config = BTreeConfig::new(KeyType::String).with_max_key_len(30);
        let mut tree = BTreeFile::create(&bpm, "idx", config).unwrap();
        let scan = tree.new_scan(None, None).unwrap();
        assert_eq!(scan.key_size_limit(), 30);
    }

    // --- Delete tests ---

    #[test]
    fn test_delete_current_every_other() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, 0..30);

        let mut scan = tree.new_scan(None, None).unwrap();
        while let Some((key, _)) = scan.get_next().unwrap() {
            if let Key::Integer(k) = key {
                if k % 2 == 0 {
                    scan.delete_current().unwrap();
                }
            }
        }
        drop(scan);

        let left = keys(tree.new_scan(None, None).unwrap());
        assert_eq!(left, (0..30).filter(|k| k % 2 == 1).collect::<Vec<_>>());
    }

    #[test]
    fn test_delete_everything_in_range() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, 0..30);

        let mut scan = tree.new_scan(Some(Key::Integer(5)), Some(Key::Integer(24))).unwrap();
        let mut seen = Vec::new();
        while let Some((key, _)) = scan.get_next().unwrap() {
            seen.push(key);
            scan.delete_current().unwrap();
        }
        drop(scan);

        assert_eq!(seen.len(), 20);
        let left = keys(tree.new_scan(None, None).unwrap());
        assert_eq!(left, (0..5).chain(25..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_delete_current_misuse() {
        let (bpm, _dir) = create_test_bpm(16);
        let mut tree = filled(&bpm, [1, 2, 3]);
        let mut scan = tree.new_scan(None, None).unwrap();

        assert!(matches!(scan.delete_current(), Err(Error::IteratorMisuse)));
        assert!(scan.get_next().unwrap().is_some());
        scan.delete_current().unwrap();
        assert!(matches!(scan.delete_current(), Err(Error::IteratorMisuse)));

        assert_eq!(scan.get_next().unwrap().map(|(k, _)| k), Some(Key::Integer(2)));
        scan.delete_current().unwrap();
    }
}
