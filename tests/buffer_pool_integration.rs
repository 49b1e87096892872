//! Integration tests for the buffer pool manager.
//!
//! These tests verify cross-component behavior that unit tests don't cover.

use pagetree::buffer::BufferPoolManager;
use pagetree::common::PageId;
use pagetree::storage::page::{PageHeader, PageType};
use pagetree::storage::DiskManager;
use pagetree::{Error, PAGE_SIZE};
use std::io::{Seek, SeekFrom, Write};
use tempfile::tempdir;

/// First byte past the common page header.
const DATA: usize = PageHeader::SIZE;

fn create_bpm(pool_size: usize) -> (BufferPoolManager, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let dm = DiskManager::create(&path).unwrap();
    (BufferPoolManager::new(pool_size, dm), dir)
}

/// Test data persistence across multiple eviction cycles.
#[test]
fn test_data_persistence_across_evictions() {
    let (bpm, _dir) = create_bpm(2);

    // Create 5 pages with unique data (forces evictions)
    let mut page_ids = vec![];
    for i in 0u8..5 {
        let mut guard = bpm.new_page().unwrap();
        guard.as_mut_slice()[DATA] = i;
        guard.as_mut_slice()[DATA + 1] = i.wrapping_mul(3);
        page_ids.push(guard.page_id());
    }
    assert_eq!(page_ids[0], PageId::new(1));

    // Read all back - verifies evicted pages were flushed
    for (i, &pid) in page_ids.iter().enumerate() {
        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(guard.as_slice()[DATA], i as u8);
        assert_eq!(guard.as_slice()[DATA + 1], (i as u8).wrapping_mul(3));
    }
}

/// Test flush and reload across BPM instances.
#[test]
fn test_flush_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let data = b"persistent!";

    let pid;

    // First session: create and write
    {
        let dm = DiskManager::create(&path).unwrap();
        let bpm = BufferPoolManager::new(10, dm);

        let mut guard = bpm.new_page().unwrap();
        pid = guard.page_id();
        guard.as_mut_slice()[DATA..DATA + data.len()].copy_from_slice(data);
        drop(guard);

        bpm.add_file_entry("blob", pid).unwrap();
        bpm.flush_all_pages().unwrap();
    }

    // Second session: verify data and the directory entry
    {
        let dm = DiskManager::open(&path).unwrap();
        let bpm = BufferPoolManager::new(10, dm);

        assert_eq!(bpm.get_file_entry("blob"), Some(pid));
        let guard = bpm.fetch_page_read(pid).unwrap();
        assert_eq!(&guard.as_slice()[DATA..DATA + data.len()], data);
    }
}

/// A flipped byte in a formatted page is caught on the next read.
#[test]
fn test_corrupted_page_detected_on_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");

    let pid;
    {
        let dm = DiskManager::create(&path).unwrap();
        let bpm = BufferPoolManager::new(4, dm);

        let mut guard = bpm.new_page().unwrap();
        pid = guard.page_id();
        guard.set_header(&PageHeader::new(PageType::BTreeLeaf, pid));
        guard.as_mut_slice()[DATA + 10] = 0xAB;
        drop(guard);
        bpm.flush_all_pages().unwrap();
    }

    {
        let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        let offset = pid.0 as u64 * PAGE_SIZE as u64 + DATA as u64 + 10;
        file.seek(SeekFrom::Start(offset)).unwrap();
        file.write_all(&[0xCD]).unwrap();
    }

    let dm = DiskManager::open(&path).unwrap();
    let bpm = BufferPoolManager::new(4, dm);
    assert!(matches!(
        bpm.fetch_page_read(pid),
        Err(Error::ChecksumMismatch(id)) if id == pid.0
    ));

    // The failed read leaves no frame behind
    assert_eq!(bpm.free_frame_count(), 4);
    assert_eq!(bpm.pinned_frame_count(), 0);
}
