//! B+ tree header page.
//!
//! One per tree. Records where the root is and the configuration the tree
//! was created with.
//!
//! # Layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       9     PageHeader (type = BTreeHeader)
//! 9       4     magic
//! 13      4     root page id
//! 17      1     key type
//! 18      2     max key length
//! 20      1     delete mode
//! 21      2     leaf capacity
//! 23      2     index capacity
//! ```

use crate::common::{Error, PageId, Result};
use crate::storage::page::{PageHeader, PageType};

use super::config::{BTreeConfig, DeleteMode};
use super::key::KeyType;

const OFFSET_MAGIC: usize = PageHeader::SIZE;
const OFFSET_ROOT: usize = OFFSET_MAGIC + 4;
const OFFSET_KEY_TYPE: usize = OFFSET_ROOT + 4;
const OFFSET_MAX_KEY_LEN: usize = OFFSET_KEY_TYPE + 1;
const OFFSET_DELETE_MODE: usize = OFFSET_MAX_KEY_LEN + 2;
const OFFSET_LEAF_CAPACITY: usize = OFFSET_DELETE_MODE + 1;
const OFFSET_INDEX_CAPACITY: usize = OFFSET_LEAF_CAPACITY + 2;

/// View of a tree header page.
pub struct HeaderPage<B> {
    data: B,
}

impl<B: AsRef<[u8]>> HeaderPage<B> {
    /// "BPTH"
    pub const MAGIC: u32 = 0x4250_5448;

    /// View an existing header page.
    ///
    /// # Errors
    /// `Corrupted` if the page type or magic number is wrong.
    pub fn open(data: B) -> Result<Self> {
        let page = Self { data };
        let header = PageHeader::from_bytes(page.bytes());
        if header.page_type != PageType::BTreeHeader || page.read_u32(OFFSET_MAGIC) != Self::MAGIC
        {
            return Err(Error::Corrupted {
                page_id: header.page_id.0,
                reason: "not a B+ tree header page".to_string(),
            });
        }
        Ok(page)
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.bytes()[offset], self.bytes()[offset + 1]])
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let b = &self.bytes()[offset..offset + 4];
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }

    fn corrupted(&self, reason: &str) -> Error {
        Error::Corrupted {
            page_id: PageId::read_from(self.bytes(), PageHeader::OFFSET_PAGE_ID).0,
            reason: reason.to_string(),
        }
    }

    /// Current root page.
    pub fn root_page_id(&self) -> PageId {
        PageId::read_from(self.bytes(), OFFSET_ROOT)
    }

    /// Stored configuration.
    pub fn config(&self) -> Result<BTreeConfig> {
        let key_type = KeyType::from_u8(self.bytes()[OFFSET_KEY_TYPE])
            .ok_or_else(|| self.corrupted("unknown key type"))?;
        let delete_mode = DeleteMode::from_u8(self.bytes()[OFFSET_DELETE_MODE])
            .ok_or_else(|| self.corrupted("unknown delete mode"))?;

        Ok(BTreeConfig::new(key_type)
            .with_max_key_len(self.read_u16(OFFSET_MAX_KEY_LEN) as usize)
            .with_delete_mode(delete_mode)
            .with_leaf_capacity(self.read_u16(OFFSET_LEAF_CAPACITY))
            .with_index_capacity(self.read_u16(OFFSET_INDEX_CAPACITY)))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> HeaderPage<B> {
    /// Format `data` as a header page for a tree with the given root.
    pub fn init(mut data: B, page_id: PageId, root: PageId, config: &BTreeConfig) -> Self {
        let bytes = data.as_mut();
        bytes.fill(0);
        PageHeader::new(PageType::BTreeHeader, page_id).write_to(bytes);
        bytes[OFFSET_MAGIC..OFFSET_MAGIC + 4].copy_from_slice(&Self::MAGIC.to_le_bytes());
        bytes[OFFSET_KEY_TYPE] = config.key_type as u8;
        bytes[OFFSET_MAX_KEY_LEN..OFFSET_MAX_KEY_LEN + 2]
            .copy_from_slice(&(config.max_key_len as u16).to_le_bytes());
        bytes[OFFSET_DELETE_MODE] = config.delete_mode as u8;
        bytes[OFFSET_LEAF_CAPACITY..OFFSET_LEAF_CAPACITY + 2]
            .copy_from_slice(&config.leaf_capacity.to_le_bytes());
        bytes[OFFSET_INDEX_CAPACITY..OFFSET_INDEX_CAPACITY + 2]
            .copy_from_slice(&config.index_capacity.to_le_bytes());

        let mut page = Self { data };
        page.set_root_page_id(root);
        page
    }

    /// Point the tree at a new root.
    pub fn set_root_page_id(&mut self, root: PageId) {
        root.write_to(self.data.as_mut(), OFFSET_ROOT);
    }
}
