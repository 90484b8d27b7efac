//! Dense retention bitmap for positional slots.
//!
//! One bit per unkeyed position, packed into `u64` words. The bitmap has an
//! explicit length: setting position `i` backfills every unset position below
//! `i` with "not retained", so there are never gaps.
//!
//! ## Architecture
//!
//! ```text
//!   words: Vec<u64>          len: 5
//!   ┌──────────────────────────────────────┐
//!   │ bit: 0 1 2 3 4 | 5 ...63 (unused)     │
//!   │      1 0 0 0 1 |  0 ...  0            │
//!   └──────────────────────────────────────┘
//!   get(7) → false (past len, never retained)
//! ```
//!
//! `clear()` drops the length to zero but keeps the word allocation, so a
//! cache that re-renders the same number of children every pass allocates
//! once.

const WORD_BITS: usize = u64::BITS as usize;

/// Explicit-length bitmap of retained positions.
#[derive(Debug, Clone, Default)]
pub struct RetainedBits {
    words: Vec<u64>,
    len: usize,
}

impl RetainedBits {
    /// Creates an empty bitmap.
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty bitmap with room for `capacity` positions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: Vec::with_capacity(capacity.div_ceil(WORD_BITS)),
            len: 0,
        }
    }

    /// Number of recorded positions (retained or backfilled).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no position has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Marks `pos` retained, backfilling earlier positions as not retained.
    pub fn set(&mut self, pos: usize) {
        if pos >= self.len {
            let needed = (pos + 1).div_ceil(WORD_BITS);
            if self.words.len() < needed {
                self.words.resize(needed, 0);
            }
            self.len = pos + 1;
        }
        self.words[pos / WORD_BITS] |= 1 << (pos % WORD_BITS);
    }

    /// Returns whether `pos` is retained. Positions past `len` are not.
    #[inline]
    pub fn get(&self, pos: usize) -> bool {
        pos < self.len && self.words[pos / WORD_BITS] & (1 << (pos % WORD_BITS)) != 0
    }

    /// Number of retained positions.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Truncates to zero length, keeping the allocation.
    pub fn clear(&mut self) {
        // Stale words past `len` must read as zero once `set` grows back over them.
        let used = self.len.div_ceil(WORD_BITS);
        self.words[..used].fill(0);
        self.len = 0;
    }

    /// Allocated capacity in positions.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.words.capacity() * WORD_BITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_backfills_unset_positions() {
        let mut bits = RetainedBits::new();
        bits.set(4);
        assert_eq!(bits.len(), 5);
        assert!(bits.get(4));
        for pos in 0..4 {
            assert!(!bits.get(pos), "position {pos} should be backfilled unset");
        }
        assert!(!bits.get(5));
        assert!(!bits.get(500));
    }

    #[test]
    fn set_across_word_boundary() {
        let mut bits = RetainedBits::new();
        bits.set(0);
        bits.set(63);
        bits.set(64);
        bits.set(130);
        assert_eq!(bits.len(), 131);
        assert_eq!(bits.count_ones(), 4);
        assert!(bits.get(64));
        assert!(!bits.get(65));
    }

    #[test]
    fn setting_lower_position_keeps_len() {
        let mut bits = RetainedBits::new();
        bits.set(9);
        bits.set(2);
        assert_eq!(bits.len(), 10);
        assert!(bits.get(2));
    }

    #[test]
    fn clear_keeps_allocation_and_zeroes_bits() {
        let mut bits = RetainedBits::with_capacity(200);
        for pos in 0..200 {
            bits.set(pos);
        }
        let capacity = bits.capacity();
        bits.clear();
        assert!(bits.is_empty());
        assert_eq!(bits.capacity(), capacity);
        assert_eq!(bits.count_ones(), 0);

        bits.set(150);
        assert!(!bits.get(10));
        assert!(bits.get(150));
        assert_eq!(bits.count_ones(), 1);
    }
}
