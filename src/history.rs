use heapless::HistoryBuffer;

use crate::telemetry::Reading;

/// Fixed-capacity reading window; the oldest reading is overwritten once full.
pub struct ReadingHistory<const N: usize> {
    buffer: HistoryBuffer<Reading, N>,
}

impl<const N: usize> Default for ReadingHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReadingHistory<N> {
    pub const fn new() -> Self {
        Self {
            buffer: HistoryBuffer::new(),
        }
    }

    pub fn push(&mut self, reading: Reading) {
        self.buffer.write(reading);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.buffer = HistoryBuffer::new();
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.buffer.recent()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.buffer.oldest_ordered()
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<Reading> {
        self.iter().copied().collect()
    }
}
