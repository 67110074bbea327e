//! Fixed-capacity circular log buffer.
//!
//! Records are addressed by logical index: 0 is the oldest live record and
//! `len() - 1` the newest, no matter where the ring currently starts.

use std::collections::VecDeque;

use bactrend_core::services::log_record::LogRecord;

/// Modulus of the sequence-number space. Sequence numbers run `1..=u32::MAX`
/// and wrap back to 1, so zero is never a valid sequence number.
const SEQUENCE_SPACE: u64 = u32::MAX as u64;

/// The sequence number `n` places after `seq`.
pub fn sequence_after(seq: u32, n: u32) -> u32 {
    let zero_based = (u64::from(seq).saturating_sub(1) + u64::from(n)) % SEQUENCE_SPACE;
    (zero_based + 1) as u32
}

/// The sequence number `n` places before `seq`.
pub fn sequence_before(seq: u32, n: u32) -> u32 {
    let back = u64::from(n) % SEQUENCE_SPACE;
    let zero_based = (u64::from(seq).saturating_sub(1) + SEQUENCE_SPACE - back) % SEQUENCE_SPACE;
    (zero_based + 1) as u32
}

/// Forward distance from sequence `from` to sequence `to`.
pub fn sequence_distance(from: u32, to: u32) -> u32 {
    let from = u64::from(from).saturating_sub(1);
    let to = u64::from(to).saturating_sub(1);
    ((to + SEQUENCE_SPACE - from) % SEQUENCE_SPACE) as u32
}

#[derive(Debug, Clone)]
pub struct TrendLogBuffer {
    records: VecDeque<LogRecord>,
    capacity: usize,
    total_record_count: u32,
}

impl TrendLogBuffer {
    /// A buffer holding at most `capacity` records. A zero capacity is raised
    /// to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            total_record_count: 0,
        }
    }

    /// Appends a record, returning the oldest one if it had to be evicted.
    pub fn push(&mut self, record: LogRecord) -> Option<LogRecord> {
        let evicted = if self.records.len() == self.capacity {
            self.records.pop_front()
        } else {
            None
        };
        self.records.push_back(record);
        self.total_record_count = if self.total_record_count == u32::MAX {
            1
        } else {
            self.total_record_count + 1
        };
        evicted
    }

    pub fn get(&self, index: usize) -> Option<&LogRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count of records ever appended, wrapping from `u32::MAX` to 1.
    pub fn total_record_count(&self) -> u32 {
        self.total_record_count
    }

    /// Sequence number of the oldest live record, or 0 when empty.
    pub fn first_sequence(&self) -> u32 {
        match self.records.len() {
            0 => 0,
            n => sequence_before(self.total_record_count, (n - 1) as u32),
        }
    }

    /// Drops every record. The total record count keeps counting.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogRecord> + ExactSizeIterator {
        self.records.iter()
    }

    pub fn newest(&self) -> Option<&LogRecord> {
        self.records.back()
    }
}
