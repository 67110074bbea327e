//! ReadRange selection over a trend log and encoding of the ACK body.
//!
//! [`resolve`] turns a range specifier into a slice of logical indexes;
//! [`encode_read_range`] writes the ReadRange-ACK service parameters for that
//! slice, trimming it to what fits in the caller's buffer.

use bactrend_core::encoding::primitives::{
    encode_closing_tag, encode_ctx_unsigned, encode_opening_tag,
};
use bactrend_core::encoding::writer::Writer;
use bactrend_core::services::read_range::{ReadRangeAckHeader, ReadRangeRequest, ReadRangeSpecifier};
use bactrend_core::types::{DateTime, ObjectType, PropertyId, ResultFlags};
use bactrend_core::EncodeError;

use crate::buffer::{sequence_after, sequence_before, sequence_distance};
use crate::error::{RangeError, ReadRangeError};
use crate::repository::{LogRepository, LogView};

/// Opening and closing `[5]` tags around the item data.
const ITEM_TAGS_LEN: usize = 2;
/// Largest encoding of the context `[6]` first-sequence-number.
const FIRST_SEQUENCE_MAX_LEN: usize = 5;

/// A run of logical indexes `start..start + count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: u32,
    pub count: u32,
}

impl Slice {
    fn end(self) -> u32 {
        self.start + self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRangeOutcome {
    pub item_count: u32,
    /// Sequence number of the first returned item, 0 for an empty result.
    pub first_sequence: u32,
    pub result_flags: ResultFlags,
    /// Bytes written to the output buffer.
    pub len: usize,
}

/// Resolves a range specifier against a log. `Ok(None)` is an empty result.
pub fn resolve<L: LogView + ?Sized>(
    log: &L,
    range: &ReadRangeSpecifier,
) -> Result<Option<Slice>, RangeError> {
    if let ReadRangeSpecifier::Unsupported { .. } = range {
        return Err(RangeError::invalid_parameter_data_type());
    }

    let n = log.record_count();
    if n == 0 {
        return Ok(None);
    }

    match *range {
        ReadRangeSpecifier::ByPosition {
            reference_index,
            count,
        } => {
            if reference_index == 0 || reference_index > n {
                return Err(RangeError::invalid_array_index());
            }
            Ok(position_slice(reference_index, count, n))
        }
        ReadRangeSpecifier::BySequenceNumber {
            reference_sequence,
            count,
        } => {
            if reference_sequence == 0 || count == 0 {
                return Ok(None);
            }
            let first_live = sequence_before(log.total_record_count(), n - 1);
            let offset = sequence_distance(first_live, reference_sequence);
            if offset >= n {
                return Ok(None);
            }
            Ok(position_slice(offset + 1, count, n))
        }
        ReadRangeSpecifier::ByTime { date, time, count } => {
            Ok(time_slice(log, DateTime::new(date, time), count, n))
        }
        ReadRangeSpecifier::ReadAll => Ok(Some(Slice { start: 0, count: n })),
        ReadRangeSpecifier::Unsupported { .. } => Err(RangeError::invalid_parameter_data_type()),
    }
}

/// Slice for a 1-based `reference` already known to be in `1..=n`.
fn position_slice(reference: u32, count: i32, n: u32) -> Option<Slice> {
    let slice = if count > 0 {
        let start = reference - 1;
        Slice {
            start,
            count: (count as u32).min(n - start),
        }
    } else {
        let back = count.unsigned_abs();
        let start = reference.saturating_sub(back);
        Slice {
            start,
            count: reference - start,
        }
    };
    (slice.count > 0).then_some(slice)
}

fn time_slice<L: LogView + ?Sized>(
    log: &L,
    reference: DateTime,
    count: i32,
    n: u32,
) -> Option<Slice> {
    if count == 0 {
        return None;
    }
    let wanted = count.unsigned_abs();
    let mut found = 0u32;
    let mut lowest = u32::MAX;
    let mut highest = 0u32;

    let mut visit = |index: u32| -> bool {
        let Some(record) = log.record(index) else {
            return true;
        };
        let matches = if count > 0 {
            record.timestamp >= reference
        } else {
            record.timestamp <= reference
        };
        if matches {
            found += 1;
            lowest = lowest.min(index);
            highest = highest.max(index);
        }
        found < wanted
    };

    if count > 0 {
        for index in 0..n {
            if !visit(index) {
                break;
            }
        }
    } else {
        for index in (0..n).rev() {
            if !visit(index) {
                break;
            }
        }
    }

    (found > 0).then(|| Slice {
        start: lowest,
        count: highest - lowest + 1,
    })
}

fn check_request(request: &ReadRangeRequest) -> Result<(), RangeError> {
    if request.property_id != PropertyId::LogBuffer {
        return Err(RangeError::property_is_not_a_list());
    }
    if request.array_index.is_some() {
        return Err(RangeError::property_is_not_an_array());
    }
    Ok(())
}

/// Encodes the ReadRange-ACK service parameters for `request` into `out`.
///
/// Records the log cannot produce are skipped. When the next record would
/// not fit, encoding stops there and the result reports more items.
pub fn encode_read_range<R: LogRepository + ?Sized>(
    repo: &R,
    request: &ReadRangeRequest,
    out: &mut [u8],
) -> Result<ReadRangeOutcome, ReadRangeError> {
    if request.object_id.object_type() != ObjectType::TrendLog {
        return Err(RangeError::unknown_object().into());
    }
    let log = repo
        .get(request.object_id.instance())
        .ok_or_else(RangeError::unknown_object)?;
    check_request(request)?;

    let header = |result_flags, item_count| ReadRangeAckHeader {
        object_id: request.object_id,
        property_id: request.property_id,
        array_index: request.array_index,
        result_flags,
        item_count,
    };

    let Some(slice) = resolve(log, &request.range)? else {
        let mut w = Writer::new(out);
        header(ResultFlags::FIRST_ITEM | ResultFlags::LAST_ITEM, 0).encode(&mut w)?;
        encode_opening_tag(&mut w, 5)?;
        encode_closing_tag(&mut w, 5)?;
        return Ok(ReadRangeOutcome {
            item_count: 0,
            first_sequence: 0,
            result_flags: ResultFlags::FIRST_ITEM | ResultFlags::LAST_ITEM,
            len: w.position(),
        });
    };

    // The header with the resolved count is at least as long as with the
    // final count, so it bounds the space left for items.
    let mut scratch = [0u8; 32];
    let header_len = {
        let mut w = Writer::new(&mut scratch);
        header(ResultFlags::empty(), slice.count).encode(&mut w)?;
        w.position()
    };
    let available = out
        .len()
        .checked_sub(header_len + ITEM_TAGS_LEN + FIRST_SEQUENCE_MAX_LEN)
        .ok_or(EncodeError::BufferTooSmall)?;

    let mut items = vec![0u8; available];
    let mut iw = Writer::new(&mut items);
    let mut item_count = 0u32;
    let mut first_index = None;
    let mut truncated = false;
    for index in slice.start..slice.end() {
        let Some(record) = log.record(index) else {
            log::debug!(
                "trend log {}: record {index} unavailable, skipped",
                request.object_id.instance()
            );
            continue;
        };
        let mark = iw.position();
        if record.encode(&mut iw).is_err() {
            iw.rewind(mark);
            truncated = true;
            break;
        }
        first_index.get_or_insert(index);
        item_count += 1;
    }
    if truncated && item_count == 0 {
        return Err(EncodeError::BufferTooSmall.into());
    }

    let n = log.record_count();
    let mut result_flags = ResultFlags::empty();
    result_flags.set(ResultFlags::FIRST_ITEM, first_index == Some(0));
    result_flags.set(ResultFlags::LAST_ITEM, slice.end() >= n && !truncated);
    result_flags.set(ResultFlags::MORE_ITEMS, slice.end() < n || truncated);

    let first_live = sequence_before(log.total_record_count(), n - 1);
    let first_sequence = first_index.map_or(0, |index| sequence_after(first_live, index));

    let mut w = Writer::new(out);
    header(result_flags, item_count).encode(&mut w)?;
    encode_opening_tag(&mut w, 5)?;
    w.write_all(iw.as_written())?;
    encode_closing_tag(&mut w, 5)?;
    if first_sequence != 0 {
        encode_ctx_unsigned(&mut w, 6, first_sequence)?;
    }

    Ok(ReadRangeOutcome {
        item_count,
        first_sequence,
        result_flags,
        len: w.position(),
    })
}
