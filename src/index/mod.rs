//! Index structures.
//!
//! - [`btree`] - Disk-resident B+ tree over integer or string keys

pub mod btree;
