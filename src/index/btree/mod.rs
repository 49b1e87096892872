//! B+ tree index.
//!
//! # Components
//! - [`BTreeFile`] - An open tree: create/open, insert, delete, scan
//! - [`BTreeScan`] - Range cursor over the leaf chain
//! - [`BTreeConfig`] - Key domain, key length and node capacities
//! - [`Key`] / [`KeyType`] - Keys and their domains
//! - Page views: [`HeaderPage`], [`IndexPage`], [`LeafPage`], built on
//!   [`SortedPage`]
//!
//! # Page Views
//! Every node view is generic over its backing bytes, `B: AsRef<[u8]>`
//! for reading and `B: AsMut<[u8]>` for writing. Views are built directly
//! on buffer pool guards:
//!
//! ```no_run
//! use pagetree::index::btree::{KeyType, LeafPage};
//! # fn demo(bpm: &pagetree::BufferPoolManager, id: pagetree::PageId) -> pagetree::Result<()> {
//! let guard = bpm.fetch_page_read(id)?;
//! let leaf = LeafPage::open(&*guard, KeyType::Integer)?;
//! println!("{} entries, next leaf {}", leaf.len(), leaf.next_leaf());
//! # Ok(())
//! # }
//! ```

mod config;
mod entry;
mod header_page;
mod index_page;
mod key;
mod leaf_page;
mod scan;
mod sorted_page;
mod tree;

pub use config::{BTreeConfig, DeleteMode};
pub use entry::{Entry, NodeKind, Payload};
pub use header_page::HeaderPage;
pub use index_page::IndexPage;
pub use key::{Key, KeyType};
pub use leaf_page::LeafPage;
pub use scan::BTreeScan;
pub use sorted_page::SortedPage;
pub use tree::BTreeFile;
