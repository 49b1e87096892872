//! File directory stored in page 0.
//!
//! Maps file names (e.g. an index name) to the first page of that file.
//! The directory is small enough to live in a single page and is kept in
//! memory by the [`DiskManager`], which writes it back on every change.
//!
//! # Page layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       9     PageHeader (type = Directory, page_id = 0)
//! 9       2     entry count
//! 11      ...   entries: [name_len: u8][name bytes][page_id: u32]
//! ```
//!
//! [`DiskManager`]: super::DiskManager

use std::collections::BTreeMap;

use crate::common::config::{DIRECTORY_PAGE_ID, MAX_FILE_NAME_LEN, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};

const OFFSET_COUNT: usize = PageHeader::SIZE;
const OFFSET_ENTRIES: usize = OFFSET_COUNT + 2;

/// In-memory copy of the file directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileDirectory {
    entries: BTreeMap<String, PageId>,
}

impl FileDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of file entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First page of the named file, if it exists.
    pub fn lookup(&self, name: &str) -> Option<PageId> {
        self.entries.get(name).copied()
    }

    /// Iterate over `(name, first page)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PageId)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    fn encoded_len(&self) -> usize {
        OFFSET_ENTRIES
            + self
                .entries
                .keys()
                .map(|n| 1 + n.len() + PageId::SIZE)
                .sum::<usize>()
    }

    /// Add an entry.
    ///
    /// # Errors
    /// `FileNameTooLong`, `DuplicateFileEntry`, or `DirectoryFull` if the
    /// encoded directory would no longer fit in one page.
    pub fn add(&mut self, name: &str, first_page: PageId) -> Result<()> {
        if name.len() > MAX_FILE_NAME_LEN {
            return Err(Error::FileNameTooLong {
                name: name.to_string(),
                len: name.len(),
                max: MAX_FILE_NAME_LEN,
            });
        }
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateFileEntry(name.to_string()));
        }
        if self.encoded_len() + 1 + name.len() + PageId::SIZE > PAGE_SIZE {
            return Err(Error::DirectoryFull);
        }
        self.entries.insert(name.to_string(), first_page);
        Ok(())
    }

    /// Remove an entry, returning its first page.
    ///
    /// # Errors
    /// `FileNotFound` if there is no such entry.
    pub fn remove(&mut self, name: &str) -> Result<PageId> {
        self.entries
            .remove(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))
    }

    /// Serialize into a directory page.
    pub fn write_to(&self, page: &mut Page) {
        page.reset();
        page.set_header(&PageHeader::new(
            PageType::Directory,
            PageId::new(DIRECTORY_PAGE_ID),
        ));

        let data = page.as_mut_slice();
        data[OFFSET_COUNT..OFFSET_COUNT + 2]
            .copy_from_slice(&(self.entries.len() as u16).to_le_bytes());

        let mut at = OFFSET_ENTRIES;
        for (name, first_page) in &self.entries {
            data[at] = name.len() as u8;
            at += 1;
            data[at..at + name.len()].copy_from_slice(name.as_bytes());
            at += name.len();
            first_page.write_to(data, at);
            at += PageId::SIZE;
        }
    }

    /// Deserialize from a directory page.
    ///
    /// # Errors
    /// `Corrupted` if the page is not a directory page or an entry runs
    /// past the end of the page.
    pub fn read_from(page: &Page) -> Result<Self> {
        let corrupted = |reason: &str| Error::Corrupted {
            page_id: DIRECTORY_PAGE_ID,
            reason: reason.to_string(),
        };

        if page.page_type() != PageType::Directory {
            return Err(corrupted("not a directory page"));
        }

        let data = page.as_slice();
        let count = u16::from_le_bytes([data[OFFSET_COUNT], data[OFFSET_COUNT + 1]]) as usize;

        let mut entries = BTreeMap::new();
        let mut at = OFFSET_ENTRIES;
        for _ in 0..count {
            let len = *data.get(at).ok_or_else(|| corrupted("truncated entry"))? as usize;
            at += 1;
            let end = at + len + PageId::SIZE;
            if end > PAGE_SIZE {
                return Err(corrupted("truncated entry"));
            }
            let name = std::str::from_utf8(&data[at..at + len])
                .map_err(|_| corrupted("file name is not UTF-8"))?;
            entries.insert(name.to_string(), PageId::read_from(data, at + len));
            at = end;
        }

        Ok(Self { entries })
    }
}
