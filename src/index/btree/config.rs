//! Configuration for a B+ tree index.

use crate::common::config::MAX_KEY_LEN;
use crate::common::{Error, Result};

use super::key::KeyType;

/// How deletions treat underfull nodes.
#[repr(u8)]
#[non_exhaustive]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove the entry and leave the node as is. Nodes are never merged
    /// or redistributed.
    #[default]
    Naive = 0,
}

impl DeleteMode {
    /// Convert from the on-disk tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DeleteMode::Naive),
            _ => None,
        }
    }
}

/// Configuration for a B+ tree, fixed at creation and stored in its header
/// page.
///
/// Capacities cap the number of entries per node; 0 means a node is full
/// only when its page runs out of bytes. Small capacities are mostly
/// useful to exercise splits with few keys.
///
/// # Example
/// ```
/// use pagetree::index::btree::{BTreeConfig, KeyType};
///
/// let config = BTreeConfig::new(KeyType::Integer).with_leaf_capacity(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeConfig {
    /// Key domain.
    pub key_type: KeyType,

    /// Longest encoded key accepted by `insert`.
    pub max_key_len: usize,

    /// Deletion policy.
    pub delete_mode: DeleteMode,

    /// Maximum entries per leaf node (0 = bounded by page bytes).
    pub leaf_capacity: u16,

    /// Maximum entries per index node (0 = bounded by page bytes).
    pub index_capacity: u16,
}

impl BTreeConfig {
    /// Configuration with defaults for the given key domain.
    ///
    /// Integer trees default to 4-byte keys, string trees to 64 bytes.
    pub fn new(key_type: KeyType) -> Self {
        let max_key_len = match key_type {
            KeyType::Integer => 4,
            KeyType::String => 64,
        };
        Self {
            key_type,
            max_key_len,
            delete_mode: DeleteMode::Naive,
            leaf_capacity: 0,
            index_capacity: 0,
        }
    }

    /// Sets the maximum encoded key length.
    pub fn with_max_key_len(mut self, max_key_len: usize) -> Self {
        self.max_key_len = max_key_len;
        self
    }

    /// Sets the delete mode.
    pub fn with_delete_mode(mut self, delete_mode: DeleteMode) -> Self {
        self.delete_mode = delete_mode;
        self
    }

    /// Sets the maximum number of entries per leaf.
    pub fn with_leaf_capacity(mut self, capacity: u16) -> Self {
        self.leaf_capacity = capacity;
        self
    }

    /// Sets the maximum number of entries per index node.
    pub fn with_index_capacity(mut self, capacity: u16) -> Self {
        self.index_capacity = capacity;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    /// `InvalidConfig` if the maximum key length is 0, above
    /// [`MAX_KEY_LEN`], or too short for an integer key, or if a capacity
    /// is 1.
    pub fn validate(&self) -> Result<()> {
        if self.max_key_len == 0 || self.max_key_len > MAX_KEY_LEN {
            return Err(Error::InvalidConfig(format!(
                "max key length {} not in 1..={}",
                self.max_key_len, MAX_KEY_LEN
            )));
        }
        if self.key_type == KeyType::Integer && self.max_key_len < 4 {
            return Err(Error::InvalidConfig(
                "integer keys need a max key length of at least 4".to_string(),
            ));
        }
        if self.leaf_capacity == 1 || self.index_capacity == 1 {
            return Err(Error::InvalidConfig(
                "node capacity must be 0 or at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self::new(KeyType::Integer)
    }
}
