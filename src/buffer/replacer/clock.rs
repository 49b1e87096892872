//! CLOCK (second chance) replacement policy.

use crate::common::FrameId;

/// CLOCK eviction over a fixed number of frames.
///
/// Each frame has a reference bit set on access. The clock hand sweeps the
/// frames in order; an evictable frame with its bit set gets the bit
/// cleared and a second chance, one with the bit clear is the victim.
/// Frames that are not evictable are skipped without touching their bit.
pub struct ClockReplacer {
    /// Reference bit per frame.
    referenced: Vec<bool>,
    /// Whether the frame may be evicted (tracked and unpinned).
    evictable: Vec<bool>,
    /// Next frame the hand will inspect.
    hand: usize,
    /// Number of evictable frames.
    size: usize,
}

impl ClockReplacer {
    /// Create a replacer for `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            referenced: vec![false; capacity],
            evictable: vec![false; capacity],
            hand: 0,
            size: 0,
        }
    }

    /// Record that a frame was accessed.
    pub fn record_access(&mut self, frame_id: FrameId) {
        if let Some(bit) = self.referenced.get_mut(frame_id.index()) {
            *bit = true;
        }
    }

    /// Mark a frame as evictable (pin count dropped to 0) or not.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let Some(slot) = self.evictable.get_mut(frame_id.index()) else {
            return;
        };
        match (*slot, evictable) {
            (false, true) => self.size += 1,
            (true, false) => self.size -= 1,
            _ => {}
        }
        *slot = evictable;
    }

    /// Select a victim frame for eviction.
    ///
    /// Returns None if no frame is evictable. The victim stops being
    /// tracked until it is marked evictable again.
    pub fn evict(&mut self) -> Option<FrameId> {
        if self.size == 0 {
            return None;
        }
        // Two sweeps are enough: the first clears every reference bit.
        for _ in 0..2 * self.evictable.len() {
            let i = self.hand;
            self.hand = (self.hand + 1) % self.evictable.len();

            if !self.evictable[i] {
                continue;
            }
            if self.referenced[i] {
                self.referenced[i] = false;
                continue;
            }
            self.evictable[i] = false;
            self.size -= 1;
            return Some(FrameId::new(i));
        }
        None
    }

    /// Stop tracking a frame entirely.
    pub fn remove(&mut self, frame_id: FrameId) {
        self.set_evictable(frame_id, false);
        if let Some(bit) = self.referenced.get_mut(frame_id.index()) {
            *bit = false;
        }
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_evictable(n: usize) -> ClockReplacer {
        let mut replacer = ClockReplacer::new(n);
        for i in 0..n {
            replacer.record_access(FrameId::new(i));
            replacer.set_evictable(FrameId::new(i), true);
        }
        replacer
    }

    #[test]
    fn test_clock_basic() {
        let mut replacer = all_evictable(3);
        assert_eq!(replacer.size(), 3);

        // All referenced: first sweep clears bits, then evicts in hand order
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), None);
        assert_eq!(replacer.size(), 0);
    }

    #[test]
    fn test_clock_skips_pinned() {
        let mut replacer = all_evictable(3);
        replacer.set_evictable(FrameId::new(0), false);
        replacer.set_evictable(FrameId::new(2), false);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_clock_second_chance() {
        let mut replacer = all_evictable(3);

        // Evict 0; hand now at 1 and bits of 1, 2 are cleared
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));

        // Touch frame 1 again: it survives the next sweep
        replacer.record_access(FrameId::new(1));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_clock_remove() {
        let mut replacer = all_evictable(2);
        replacer.remove(FrameId::new(0));
        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_clock_set_evictable_idempotent() {
        let mut replacer = ClockReplacer::new(4);
        replacer.set_evictable(FrameId::new(2), true);
        replacer.set_evictable(FrameId::new(2), true);
        assert_eq!(replacer.size(), 1);
        replacer.set_evictable(FrameId::new(2), false);
        replacer.set_evictable(FrameId::new(2), false);
        assert_eq!(replacer.size(), 0);
        // Out of range frames are ignored
        replacer.set_evictable(FrameId::new(9), true);
        assert_eq!(replacer.size(), 0);
    }
}
