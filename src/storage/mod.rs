//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level file I/O
//! - [`FileDirectory`] - Name to first-page mapping kept in page 0
//! - [`page`] - Page types and layouts

mod directory;
mod disk_manager;
pub mod page;

pub use directory::FileDirectory;
pub use disk_manager::DiskManager;
