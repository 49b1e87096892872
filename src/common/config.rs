//! Configuration constants for pagetree.

/// Size of a page in bytes (4KB).
///
/// Every on-disk structure (directory, B+ tree header, index and leaf
/// nodes) occupies exactly one page. Slot offsets inside a page are stored
/// as `u16`, so this must stay below 64KB.
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 = 4,294,967,296 pages
/// - Max database size: 4,294,967,296 × 4KB = 16TB
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages with u32 PageId.
pub const MAX_PAGES: u64 = (u32::MAX as u64) + 1;

/// Maximum theoretical database size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;

/// Page 0 of every database file holds the file directory.
///
/// The buffer pool never hands this page out.
pub const DIRECTORY_PAGE_ID: u32 = 0;

/// Longest file name accepted by the file directory, in bytes.
pub const MAX_FILE_NAME_LEN: usize = 50;

/// Upper bound for the configured maximum key length of a B+ tree.
///
/// Keeps at least three maximal leaf entries on a page, so a split always
/// leaves room for the entry that triggered it.
pub const MAX_KEY_LEN: usize = 1024;
