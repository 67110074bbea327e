use std::io::Write;

use bactrend_core::services::log_record::LogRecord;
use serde::Serialize;

use crate::clock::from_bacnet;

pub const CSV_HEADER: [&str; 3] = ["Timestamp", "Value", "Status"];

/// One exported row. Value is empty for log-status and null records, and so
/// is Timestamp when the record carries unspecified date fields.
#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp: Option<String>,
    value: Option<String>,
    status: u8,
}

impl From<&LogRecord> for CsvRow {
    fn from(record: &LogRecord) -> Self {
        Self {
            timestamp: from_bacnet(record.timestamp)
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            value: record.datum.as_f64().map(|v| format!("{v:.2}")),
            status: record.status_flags.bits(),
        }
    }
}

/// Writes records as `Timestamp,Value,Status` rows under a header. Status is
/// the status-flags octet. Returns the number of rows written.
pub fn write_csv<'a, W, I>(out: W, records: I) -> Result<usize, csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(CSV_HEADER)?;
    let mut rows = 0;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::write_csv;
    use bactrend_core::services::log_record::{LogDatum, LogRecord};
    use bactrend_core::types::{Date, DateTime, LogStatus, StatusFlags, Time};

    fn at(second: u8) -> DateTime {
        DateTime::new(Date::from_ymd(2025, 2, 3).unwrap(), Time::hms(4, 5, second))
    }

    #[test]
    fn rows_follow_header() {
        let records = [
            LogRecord::new(at(6), LogDatum::Real(21.456), StatusFlags::FAULT),
            LogRecord::new(
                at(6),
                LogDatum::LogStatus(LogStatus::LOG_DISABLED),
                StatusFlags::empty(),
            ),
        ];
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &records).unwrap(), 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Timestamp,Value,Status\n\
             2025-02-03 04:05:06,21.46,2\n\
             2025-02-03 04:05:06,,0\n"
        );
    }

    #[test]
    fn empty_log_still_gets_a_header() {
        let records: [LogRecord; 0] = [];
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &records).unwrap(), 0);
        assert_eq!(out, b"Timestamp,Value,Status\n");
    }

    #[test]
    fn unspecified_timestamp_leaves_the_field_empty() {
        let mut record = LogRecord::new(at(0), LogDatum::Unsigned(7), StatusFlags::empty());
        record.timestamp.date.month = 0xFF;
        let mut out = Vec::new();
        write_csv(&mut out, &[record]).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("\n,7.00,0\n"));
    }
}
