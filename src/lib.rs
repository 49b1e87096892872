//! pagetree - a disk-resident B+ tree index on a paged file.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            pagetree                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │    BTreeFile (insert / delete / scan) + BTreeScan        │   │
//! │  │    Header / Index / Leaf page views over SortedPage      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Buffer Pool (buffer/)                       │   │
//! │  │   BufferPoolManager + Frame + CLOCK replacer             │   │
//! │  │   Page guards: read / write latched, or pin only         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │   DiskManager + file directory (page 0) + page formats   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, config)
//! - [`storage`] - Disk I/O, the file directory and page formats
//! - [`buffer`] - Buffer pool management and eviction
//! - [`index`] - The B+ tree
//!
//! # Quick Start
//! ```no_run
//! use pagetree::{BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Key, PageId, RecordId};
//!
//! let dm = DiskManager::open_or_create("my_index.db").unwrap();
//! let bpm = BufferPoolManager::new(64, dm);
//!
//! let mut tree = BTreeFile::create(&bpm, "orders_by_id", BTreeConfig::default()).unwrap();
//! tree.insert(&Key::from(42), RecordId::new(PageId::new(7), 3)).unwrap();
//!
//! for entry in tree.new_scan(Some(Key::from(40)), None).unwrap() {
//!     let (key, rid) = entry.unwrap();
//!     println!("{} -> {}", key, rid);
//! }
//!
//! tree.close();
//! bpm.flush_all_pages().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, PageId, RecordId, Result};

pub use buffer::{BufferPoolManager, Frame, PinnedPage};
pub use index::btree::{BTreeConfig, BTreeFile, BTreeScan, Key, KeyType};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::DiskManager;
