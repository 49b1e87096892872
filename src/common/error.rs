//! Error types for pagetree.

use thiserror::Error;

use crate::index::btree::KeyType;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagetree.
///
/// Storage, buffer pool and index errors share one enum so that `?` works
/// across layers without conversion boilerplate.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// The page ID is a sentinel or reserved (e.g. the directory page).
    #[error("Invalid page ID: {0}")]
    InvalidPageId(u32),

    /// A formatted page failed CRC verification when read from disk.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(u32),

    /// A page's contents do not match what the reader expects.
    #[error("Page {page_id} is corrupted: {reason}")]
    Corrupted {
        /// Page being read.
        page_id: u32,
        /// What was wrong with it.
        reason: String,
    },

    /// An index entry could not be decoded.
    #[error("Malformed index entry: {0}")]
    MalformedEntry(&'static str),

    /// No file entry with this name in the directory.
    #[error("File entry '{0}' not found")]
    FileNotFound(String),

    /// A file entry with this name already exists.
    #[error("File entry '{0}' already exists")]
    DuplicateFileEntry(String),

    /// The file name does not fit in a directory entry.
    #[error("File name '{name}' is too long ({len} bytes, max {max})")]
    FileNameTooLong {
        /// Offending name.
        name: String,
        /// Its length in bytes.
        len: usize,
        /// Longest accepted name.
        max: usize,
    },

    /// The directory page has no room for another entry.
    #[error("File directory is full")]
    DirectoryFull,

    /// Encoded key is longer than the tree's configured maximum.
    #[error("Key length {len} exceeds the maximum of {max} bytes")]
    KeyTooLong {
        /// Encoded length of the rejected key.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Key domain differs from the tree's key domain.
    #[error("Key type mismatch: index expects {expected}, got {found}")]
    KeyTypeMismatch {
        /// Domain the tree was created with.
        expected: KeyType,
        /// Domain of the rejected key.
        found: KeyType,
    },

    /// A freshly split node still could not take the pending entry.
    #[error("Node {0} has no room for the entry after splitting")]
    NodeFull(u32),

    /// Scan cursor has no current entry to operate on.
    #[error("Scan has no current entry")]
    IteratorMisuse,

    /// Tree configuration rejected at creation.
    #[error("Invalid index configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::NoFreeFrames;
        assert_eq!(format!("{}", err), "No free frames available in buffer pool");

        let err = Error::KeyTooLong { len: 12, max: 8 };
        assert_eq!(
            format!("{}", err),
            "Key length 12 exceeds the maximum of 8 bytes"
        );
    }

    #[test]
    fn test_key_type_mismatch_display() {
        let err = Error::KeyTypeMismatch {
            expected: KeyType::Integer,
            found: KeyType::String,
        };
        assert_eq!(
            format!("{}", err),
            "Key type mismatch: index expects integer, got string"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
        assert!(std::error::Error::source(&Error::NoFreeFrames).is_none());
    }
}
