use bactrend_core::services::log_record::LogRecord;

/// Read access to one trend log, as the ReadRange encoder needs it.
///
/// Logical index 0 is the oldest live record. Indexes stay stable between
/// overwrites only while the caller holds whatever lock guards the log.
pub trait LogView {
    fn record_count(&self) -> u32;

    /// Records ever appended, wrapping from `u32::MAX` to 1.
    fn total_record_count(&self) -> u32;

    /// `None` when the record cannot be resolved; the encoder skips it.
    fn record(&self, index: u32) -> Option<LogRecord>;
}

/// Lookup of trend logs by object instance.
pub trait LogRepository {
    type Log: LogView;

    fn get(&self, instance: u32) -> Option<&Self::Log>;
}

impl LogView for crate::buffer::TrendLogBuffer {
    fn record_count(&self) -> u32 {
        self.len() as u32
    }

    fn total_record_count(&self) -> u32 {
        crate::buffer::TrendLogBuffer::total_record_count(self)
    }

    fn record(&self, index: u32) -> Option<LogRecord> {
        self.get(index as usize).copied()
    }
}
