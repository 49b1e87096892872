//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Automatic dirty page write-back
//! - CLOCK eviction
//! - Access to the file directory of the underlying database file

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{Frame, PageReadGuard, PageWriteGuard, PinnedPage};
use crate::common::config::DIRECTORY_PAGE_ID;
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │PageId → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │disk_manager  │      │
/// │  │ Vec<FrameId> │  │ClockReplacer │  │   Mutex      │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `page_table`: `RwLock` — many readers, few writers
/// - `free_list`: `Mutex` — always modified
/// - `replacer`: `Mutex` — internal state changes on access
/// - `disk_manager`: `Mutex` — single-threaded I/O
/// - `frames`: No lock — fixed size, each Frame has internal locks
///
/// Page 0 holds the file directory and is never handed out as a page;
/// use [`get_file_entry`](Self::get_file_entry) and friends instead.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, dm);
///
/// // Allocate a new page
/// let mut guard = bpm.new_page()?;
/// let page_id = guard.page_id();
/// guard.as_mut_slice()[100] = 0xAB;
/// drop(guard); // page marked dirty, unpinned
///
/// // Fetch existing page for reading
/// let guard = bpm.fetch_page_read(page_id)?;
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Maps page IDs to frame IDs.
    page_table: RwLock<HashMap<PageId, FrameId>>,

    /// Stack of free frame IDs (LIFO for cache locality).
    free_list: Mutex<Vec<FrameId>>,

    /// Eviction policy for selecting victim frames.
    replacer: Mutex<ClockReplacer>,

    /// Handles all disk I/O.
    disk_manager: Mutex<DiskManager>,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Arguments
    /// * `pool_size` - Number of frames in the pool
    /// * `disk_manager` - Handles disk I/O
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        // Allocate all frames upfront
        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();

        // All frames start on the free list; reversed so frame 0 pops first
        let free_list: Vec<FrameId> = (0..pool_size).rev().map(FrameId::new).collect();

        Self {
            frames,
            page_table: RwLock::new(HashMap::new()),
            free_list: Mutex::new(free_list),
            replacer: Mutex::new(ClockReplacer::new(pool_size)),
            disk_manager: Mutex::new(disk_manager),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// If the page is already in the buffer pool, returns immediately.
    /// Otherwise, loads the page from disk (possibly evicting another page).
    ///
    /// # Errors
    /// - `Error::InvalidPageId` for the sentinel id or the directory page
    /// - `Error::PageNotFound` if the page doesn't exist on disk
    /// - `Error::NoFreeFrames` if all frames are pinned
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page();

        Ok(PageReadGuard::new(self, frame_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// Same as `fetch_page_read`, but returns an exclusive guard.
    /// The page is automatically marked dirty when the guard drops.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Pin a page without latching it.
    ///
    /// The returned handle keeps the page resident until dropped.
    pub fn pin_page(&self, page_id: PageId) -> Result<PinnedPage<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        Ok(PinnedPage::new(self, frame_id, page_id))
    }

    // ========================================================================
    // Public API: Create pages
    // ========================================================================

    /// Allocate a new page on disk and load it into the buffer pool.
    ///
    /// Returns a write guard for the new, zeroed page.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if all frames are pinned
    /// - I/O errors from disk allocation
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        // Get a free frame (or evict one)
        let frame_id = self.get_free_frame()?;

        // Allocate page on disk
        let page_id = {
            let mut dm = self.disk_manager.lock();
            match dm.allocate_page() {
                Ok(page_id) => page_id,
                Err(e) => {
                    self.free_list.lock().push(frame_id);
                    return Err(e);
                }
            }
        };

        let frame = &self.frames[frame_id.0];
        frame.page_mut().reset();
        frame.set_page_id(Some(page_id));

        // New page starts with pin_count = 1
        frame.pin();

        self.page_table.write().insert(page_id, frame_id);

        // Record access with replacer (not evictable since pinned)
        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }

        trace!(page_id = page_id.0, frame_id = frame_id.0, "allocated page");

        let lock = frame.page_mut();
        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Flush a specific page to disk if it's dirty.
    ///
    /// # Errors
    /// - I/O errors from disk write
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let frame_id = {
            let pt = self.page_table.read();
            match pt.get(&page_id) {
                Some(&fid) => fid,
                None => return Ok(()), // Page not in pool
            }
        };

        self.flush_frame(frame_id, page_id)
    }

    /// Flush all dirty pages to disk.
    ///
    /// # Errors
    /// - I/O errors from disk writes
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages: Vec<(PageId, FrameId)> = {
            let pt = self.page_table.read();
            pt.iter().map(|(&pid, &fid)| (pid, fid)).collect()
        };

        let count = pages.len();
        for (page_id, frame_id) in pages {
            self.flush_frame(frame_id, page_id)?;
        }

        debug!(pages = count, "flushed buffer pool");
        Ok(())
    }

    // ========================================================================
    // Public API: File directory
    // ========================================================================

    /// First page of the named file, if it exists.
    pub fn get_file_entry(&self, name: &str) -> Option<PageId> {
        self.disk_manager.lock().lookup_file(name)
    }

    /// Record a new named file starting at `first_page`.
    pub fn add_file_entry(&self, name: &str, first_page: PageId) -> Result<()> {
        self.disk_manager.lock().add_file_entry(name, first_page)
    }

    /// Remove a named file entry. Its pages are not reclaimed.
    pub fn delete_file_entry(&self, name: &str) -> Result<()> {
        self.disk_manager.lock().delete_file_entry(name).map(|_| ())
    }

    // ========================================================================
    // Public API: Pool info
    // ========================================================================

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Get the number of pages in the buffer pool.
    pub fn page_count(&self) -> usize {
        self.page_table.read().len()
    }

    /// Pin count of a resident page, or `None` if it is not in the pool.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let pt = self.page_table.read();
        pt.get(&page_id).map(|fid| self.frames[fid.0].pin_count())
    }

    /// Number of frames currently pinned.
    pub fn pinned_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_pinned()).count()
    }

    // ========================================================================
    // Internal: Called by page guards
    // ========================================================================

    /// Frame by id. Used by `PinnedPage` to latch its page.
    #[inline]
    pub(crate) fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.0]
    }

    /// Unpin a page. Called by the page guards on drop.
    pub(crate) fn unpin_page_internal(&self, frame_id: FrameId, is_dirty: bool) {
        let frame = &self.frames[frame_id.0];

        if is_dirty {
            frame.mark_dirty();
        }

        let new_pin_count = frame.unpin();

        // If pin count dropped to 0, page is now evictable
        if new_pin_count == 0 {
            let mut replacer = self.replacer.lock();
            replacer.set_evictable(frame_id, true);
        }
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    /// Fetch a page into the buffer pool and pin it, returning its frame ID.
    fn fetch_page_internal(&self, page_id: PageId) -> Result<FrameId> {
        if !page_id.is_valid() || page_id.0 == DIRECTORY_PAGE_ID {
            return Err(Error::InvalidPageId(page_id.0));
        }

        // Fast path: check if page is already in pool (read lock only)
        {
            let pt = self.page_table.read();
            if let Some(&frame_id) = pt.get(&page_id) {
                self.handle_cache_hit(frame_id);
                return Ok(frame_id);
            }
        }

        self.handle_cache_miss(page_id)
    }

    /// Handle a cache hit: pin the frame and update replacer.
    fn handle_cache_hit(&self, frame_id: FrameId) {
        let frame = &self.frames[frame_id.0];
        frame.pin();

        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }
    }

    /// Handle a cache miss: get a frame, load from disk, update mappings.
    fn handle_cache_miss(&self, page_id: PageId) -> Result<FrameId> {
        let frame_id = self.get_free_frame()?;

        let page_data = {
            let mut dm = self.disk_manager.lock();
            match dm.read_page(page_id) {
                Ok(page) => page,
                Err(e) => {
                    self.free_list.lock().push(frame_id);
                    return Err(e);
                }
            }
        };

        let frame = &self.frames[frame_id.0];
        frame
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page_data.as_slice());
        frame.set_page_id(Some(page_id));
        frame.pin();

        self.page_table.write().insert(page_id, frame_id);

        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }

        Ok(frame_id)
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get a free frame, evicting if necessary.
    fn get_free_frame(&self) -> Result<FrameId> {
        {
            let mut fl = self.free_list.lock();
            if let Some(frame_id) = fl.pop() {
                return Ok(frame_id);
            }
        }

        self.evict_page()
    }

    /// Evict a page and return its frame.
    fn evict_page(&self) -> Result<FrameId> {
        let frame_id = {
            let mut replacer = self.replacer.lock();
            replacer.evict().ok_or(Error::NoFreeFrames)?
        };

        let frame = &self.frames[frame_id.0];
        let old_page_id = frame.page_id();

        if let Some(pid) = old_page_id {
            if let Err(e) = self.flush_frame(frame_id, pid) {
                // Put the victim back so it can be retried later
                self.replacer.lock().set_evictable(frame_id, true);
                return Err(e);
            }
            self.page_table.write().remove(&pid);
            trace!(page_id = pid.0, frame_id = frame_id.0, "evicted page");
        }

        frame.clear_dirty();
        frame.set_page_id(None);

        Ok(frame_id)
    }

    /// Flush a frame to disk if dirty.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];

        if frame.is_dirty() {
            // Hold page read lock while writing to disk
            let page = frame.page();
            {
                let mut dm = self.disk_manager.lock();
                dm.write_page(page_id, &page)?;
            }
            drop(page);

            frame.clear_dirty();
        }

        Ok(())
    }
}
