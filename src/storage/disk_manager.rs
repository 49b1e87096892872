//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages, with checksum stamping and verification
//! - Allocating new pages
//! - Maintaining the file directory in page 0

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::common::config::{DIRECTORY_PAGE_ID, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::directory::FileDirectory;
use crate::storage::page::{Page, PageHeader};

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// The database is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌───────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0    │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ directory │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └───────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0       4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`. Page 0 always holds
/// the [`FileDirectory`].
///
/// # Integrity
/// Pages whose header carries a type tag are checksummed on write and
/// verified on read, together with the page id stored in their header.
/// Unformatted pages (type `Invalid`) pass through untouched.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` is responsible
/// for serializing access to the disk manager.
///
/// # Durability
/// Page writes are followed by `sync_data()`. There is no write-ahead log.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
    directory: FileDirectory,
}

impl DiskManager {
    /// Create a new database file with an empty directory.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        let mut dm = Self {
            file,
            page_count: 0,
            directory: FileDirectory::new(),
        };
        let page_id = dm.allocate_page()?;
        debug_assert_eq!(page_id.0, DIRECTORY_PAGE_ID);
        dm.write_directory()?;

        debug!(path = %path.as_ref().display(), "created database file");
        Ok(dm)
    }

    /// Open an existing database file and load its directory.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or its
    /// directory page is damaged.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        // Calculate page count from file size
        let metadata = file.metadata()?;
        let page_count = (metadata.len() / PAGE_SIZE as u64) as u32;

        let mut dm = Self {
            file,
            page_count,
            directory: FileDirectory::new(),
        };
        let page = dm.read_page(PageId::new(DIRECTORY_PAGE_ID))?;
        dm.directory = FileDirectory::read_from(&page)?;

        debug!(
            path = %path.as_ref().display(),
            pages = page_count,
            files = dm.directory.len(),
            "opened database file"
        );
        Ok(dm)
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// - `PageNotFound` if the page doesn't exist.
    /// - `ChecksumMismatch` if a formatted page fails verification.
    /// - `Corrupted` if a formatted page carries another page's id.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        let header = page.header();
        if header.page_type.is_formatted() {
            if !header.verify_checksum(page.as_slice()) {
                return Err(Error::ChecksumMismatch(page_id.0));
            }
            if header.page_id != page_id {
                return Err(Error::Corrupted {
                    page_id: page_id.0,
                    reason: format!("header names {}", header.page_id),
                });
            }
        }

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    /// Formatted pages get a fresh checksum in the bytes written; the
    /// caller's copy is left as is.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;

        if page.page_type().is_formatted() {
            let mut buf = [0u8; PAGE_SIZE];
            buf.copy_from_slice(page.as_slice());
            PageHeader::stamp_checksum(&mut buf);
            self.file.write_all(&buf)?;
        } else {
            self.file.write_all(page.as_slice())?;
        }
        self.file.sync_data()?;

        trace!(page_id = page_id.0, "wrote page");
        Ok(())
    }

    /// Allocate a new page on disk.
    ///
    /// Returns the `PageId` of the newly allocated page. The file is
    /// extended with `set_len`, so the page reads back as zeros.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.page_count);
        let new_len = (page_id.0 as u64 + 1) * (PAGE_SIZE as u64);
        self.file.set_len(new_len)?;

        self.page_count += 1;
        Ok(page_id)
    }

    /// Get the number of pages in the database.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    // ========================================================================
    // File directory
    // ========================================================================

    /// First page of the named file, if it exists.
    pub fn lookup_file(&self, name: &str) -> Option<PageId> {
        self.directory.lookup(name)
    }

    /// Add a file entry and persist the directory.
    pub fn add_file_entry(&mut self, name: &str, first_page: PageId) -> Result<()> {
        self.directory.add(name, first_page)?;
        if let Err(e) = self.write_directory() {
            self.directory.remove(name)?;
            return Err(e);
        }
        debug!(name, first_page = first_page.0, "added file entry");
        Ok(())
    }

    /// Remove a file entry and persist the directory.
    pub fn delete_file_entry(&mut self, name: &str) -> Result<PageId> {
        let first_page = self.directory.remove(name)?;
        self.write_directory()?;
        debug!(name, "deleted file entry");
        Ok(first_page)
    }

    /// Read-only view of the directory.
    pub fn directory(&self) -> &FileDirectory {
        &self.directory
    }

    fn write_directory(&mut self) -> Result<()> {
        let mut page = Page::new();
        self.directory.write_to(&mut page);
        self.write_page(PageId::new(DIRECTORY_PAGE_ID), &page)
    }
}
