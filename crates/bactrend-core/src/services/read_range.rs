//! ReadRange (service choice 26) request and acknowledgement.
//!
//! ```text
//! ReadRange-Request ::= SEQUENCE {
//!     objectIdentifier   [0] BACnetObjectIdentifier,
//!     propertyIdentifier [1] BACnetPropertyIdentifier,
//!     propertyArrayIndex [2] Unsigned OPTIONAL,
//!     range CHOICE {
//!         byPosition       [3] SEQUENCE { referenceIndex Unsigned, count INTEGER },
//!         bySequenceNumber [6] SEQUENCE { referenceSequenceNumber Unsigned, count INTEGER },
//!         byTime           [7] SEQUENCE { referenceTime BACnetDateTime, count INTEGER }
//!     } OPTIONAL
//! }
//! ```

use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{
    primitives::{
        decode_app_date, decode_app_signed, decode_app_time, decode_app_unsigned,
        decode_bit_string, encode_app_date, encode_app_signed, encode_app_time,
        encode_app_unsigned, encode_closing_tag, encode_ctx_object_id, encode_ctx_unsigned,
        encode_opening_tag, expect_closing_tag,
    },
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::services::{
    context_len, decode_ctx_object_id, decode_ctx_unsigned, decode_ctx_unsigned_opt,
};
use crate::types::{Date, ObjectId, PropertyId, ResultFlags, Time};
use crate::{DecodeError, EncodeError};

#[cfg(feature = "alloc")]
use crate::encoding::primitives::expect_opening_tag;
#[cfg(feature = "alloc")]
use crate::services::log_record::LogRecord;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

pub const SERVICE_READ_RANGE: u8 = 0x1A;

const BY_POSITION: u8 = 3;
const ITEM_DATA: u8 = 5;
const BY_SEQUENCE_NUMBER: u8 = 6;
const BY_TIME: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRangeSpecifier {
    /// 1-based position and signed count.
    ByPosition { reference_index: u32, count: i32 },
    BySequenceNumber { reference_sequence: u32, count: i32 },
    ByTime { date: Date, time: Time, count: i32 },
    /// No range given: the whole list.
    ReadAll,
    /// A range choice this codec does not implement, e.g. the obsolete
    /// time-range forms [4] and [5]. Carries the context tag number.
    Unsupported { choice: u8 },
}

impl ReadRangeSpecifier {
    fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let (choice, count) = match *self {
            Self::ReadAll => return Ok(()),
            Self::Unsupported { .. } => return Err(EncodeError::Unsupported),
            Self::ByPosition {
                reference_index,
                count,
            } => {
                encode_opening_tag(w, BY_POSITION)?;
                encode_app_unsigned(w, reference_index)?;
                (BY_POSITION, count)
            }
            Self::BySequenceNumber {
                reference_sequence,
                count,
            } => {
                encode_opening_tag(w, BY_SEQUENCE_NUMBER)?;
                encode_app_unsigned(w, reference_sequence)?;
                (BY_SEQUENCE_NUMBER, count)
            }
            Self::ByTime { date, time, count } => {
                encode_opening_tag(w, BY_TIME)?;
                encode_app_date(w, date)?;
                encode_app_time(w, time)?;
                (BY_TIME, count)
            }
        };
        encode_app_signed(w, count)?;
        encode_closing_tag(w, choice)
    }

    /// An empty remainder means no range. Unknown choices are skipped whole
    /// and reported as [`Self::Unsupported`] so the caller can refuse them
    /// with an Error PDU rather than a Reject.
    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.is_empty() {
            return Ok(Self::ReadAll);
        }
        let Tag::Opening { tag_num: choice } = Tag::decode(r)? else {
            return Err(DecodeError::InvalidTag);
        };
        let range = match choice {
            BY_POSITION => Self::ByPosition {
                reference_index: decode_app_unsigned(r)?,
                count: decode_app_signed(r)?,
            },
            BY_SEQUENCE_NUMBER => Self::BySequenceNumber {
                reference_sequence: decode_app_unsigned(r)?,
                count: decode_app_signed(r)?,
            },
            BY_TIME => Self::ByTime {
                date: decode_app_date(r)?,
                time: decode_app_time(r)?,
                count: decode_app_signed(r)?,
            },
            choice => {
                skip_constructed(r, choice)?;
                return Ok(Self::Unsupported { choice });
            }
        };
        expect_closing_tag(r, choice)?;
        Ok(range)
    }
}

/// Consumes the contents of an already-opened `[tag_num]` through its
/// closing tag.
fn skip_constructed(r: &mut Reader<'_>, tag_num: u8) -> Result<(), DecodeError> {
    let mut nested = 0usize;
    loop {
        match Tag::decode(r)? {
            Tag::Closing { tag_num: closed } if nested == 0 => {
                if closed != tag_num {
                    return Err(DecodeError::InvalidTag);
                }
                return Ok(());
            }
            Tag::Closing { .. } => nested -= 1,
            Tag::Opening { .. } => nested += 1,
            Tag::Application {
                tag: AppTag::Boolean,
                ..
            } => {}
            Tag::Application { len, .. } | Tag::Context { len, .. } => {
                r.read_exact(len as usize)?;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRangeRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub range: ReadRangeSpecifier,
    pub invoke_id: u8,
}

impl ReadRangeRequest {
    pub const fn new(
        object_id: ObjectId,
        property_id: PropertyId,
        range: ReadRangeSpecifier,
        invoke_id: u8,
    ) -> Self {
        Self {
            object_id,
            property_id,
            array_index: None,
            range,
            invoke_id,
        }
    }

    pub const fn by_position(
        object_id: ObjectId,
        property_id: PropertyId,
        reference_index: u32,
        count: i32,
        invoke_id: u8,
    ) -> Self {
        let range = ReadRangeSpecifier::ByPosition {
            reference_index,
            count,
        };
        Self::new(object_id, property_id, range, invoke_id)
    }

    pub const fn by_sequence_number(
        object_id: ObjectId,
        property_id: PropertyId,
        reference_sequence: u32,
        count: i32,
        invoke_id: u8,
    ) -> Self {
        let range = ReadRangeSpecifier::BySequenceNumber {
            reference_sequence,
            count,
        };
        Self::new(object_id, property_id, range, invoke_id)
    }

    pub const fn by_time(
        object_id: ObjectId,
        property_id: PropertyId,
        date: Date,
        time: Time,
        count: i32,
        invoke_id: u8,
    ) -> Self {
        let range = ReadRangeSpecifier::ByTime { date, time, count };
        Self::new(object_id, property_id, range, invoke_id)
    }

    pub const fn read_all(object_id: ObjectId, property_id: PropertyId, invoke_id: u8) -> Self {
        Self::new(object_id, property_id, ReadRangeSpecifier::ReadAll, invoke_id)
    }

    /// The whole confirmed-request APDU, header included.
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(self.invoke_id, SERVICE_READ_RANGE).encode(w)?;
        self.encode_service(w)
    }

    pub fn encode_service(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            encode_ctx_unsigned(w, 2, index)?;
        }
        self.range.encode(w)
    }

    /// Decodes the service parameters after a confirmed-request header.
    /// Anything left in `r` afterwards is the caller's to judge.
    pub fn decode_after_header(r: &mut Reader<'_>, invoke_id: u8) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: decode_ctx_object_id(r, 0)?,
            property_id: PropertyId::from_u32(decode_ctx_unsigned(r, 1)?),
            array_index: decode_ctx_unsigned_opt(r, 2)?,
            range: ReadRangeSpecifier::decode(r)?,
            invoke_id,
        })
    }
}

/// The fixed part of a ReadRange-ACK, up to and excluding the item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRangeAckHeader {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub result_flags: ResultFlags,
    pub item_count: u32,
}

impl ReadRangeAckHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            encode_ctx_unsigned(w, 2, index)?;
        }
        self.result_flags.encode_context(w, 3)?;
        encode_ctx_unsigned(w, 4, self.item_count)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let object_id = decode_ctx_object_id(r, 0)?;
        let property_id = PropertyId::from_u32(decode_ctx_unsigned(r, 1)?);
        let array_index = decode_ctx_unsigned_opt(r, 2)?;
        let flags_len = context_len(r, 3)?;
        let result_flags = ResultFlags::from_bit_string(decode_bit_string(r, flags_len)?);
        Ok(Self {
            object_id,
            property_id,
            array_index,
            result_flags,
            item_count: decode_ctx_unsigned(r, 4)?,
        })
    }
}

#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRangeAck {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub result_flags: ResultFlags,
    pub item_count: u32,
    pub items: Vec<LogRecord>,
    /// Sequence number of the first item; omitted on the wire when zero.
    pub first_sequence_number: Option<u32>,
}

#[cfg(feature = "alloc")]
impl ReadRangeAck {
    pub fn header(&self) -> ReadRangeAckHeader {
        ReadRangeAckHeader {
            object_id: self.object_id,
            property_id: self.property_id,
            array_index: self.array_index,
            result_flags: self.result_flags,
            item_count: self.item_count,
        }
    }

    /// Encodes the service parameters that follow a Complex-ACK header.
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        self.header().encode(w)?;
        encode_opening_tag(w, ITEM_DATA)?;
        self.items.iter().try_for_each(|item| item.encode(w))?;
        encode_closing_tag(w, ITEM_DATA)?;
        match self.first_sequence_number {
            Some(seq) if seq != 0 => encode_ctx_unsigned(w, 6, seq),
            _ => Ok(()),
        }
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let header = ReadRangeAckHeader::decode(r)?;
        expect_opening_tag(r, ITEM_DATA)?;
        let mut items = Vec::new();
        while !Tag::peek(r)?.is_closing(ITEM_DATA) {
            items.push(LogRecord::decode(r)?);
        }
        expect_closing_tag(r, ITEM_DATA)?;

        Ok(Self {
            object_id: header.object_id,
            property_id: header.property_id,
            array_index: header.array_index,
            result_flags: header.result_flags,
            item_count: header.item_count,
            items,
            first_sequence_number: decode_ctx_unsigned_opt(r, 6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "alloc")]
    use super::ReadRangeAck;
    use super::{ReadRangeRequest, ReadRangeSpecifier, SERVICE_READ_RANGE};
    use crate::apdu::ConfirmedRequestHeader;
    use crate::encoding::{reader::Reader, writer::Writer};
    #[cfg(feature = "alloc")]
    use crate::services::log_record::{LogDatum, LogRecord};
    use crate::types::{Date, ObjectId, ObjectType, PropertyId, Time};
    #[cfg(feature = "alloc")]
    use crate::types::{DateTime, ResultFlags, StatusFlags};

    fn trend_log() -> ObjectId {
        ObjectId::new(ObjectType::TrendLog, 1)
    }

    fn decode_request(bytes: &[u8]) -> ReadRangeRequest {
        let mut r = Reader::new(bytes);
        let header = ConfirmedRequestHeader::decode(&mut r).unwrap();
        assert_eq!(header.service_choice, SERVICE_READ_RANGE);
        ReadRangeRequest::decode_after_header(&mut r, header.invoke_id).unwrap()
    }

    #[test]
    fn request_roundtrips_every_range_form() {
        let date = Date::from_ymd(2025, 1, 2).unwrap();
        let requests = [
            ReadRangeRequest::by_position(trend_log(), PropertyId::LogBuffer, 5, -3, 1),
            ReadRangeRequest::by_sequence_number(trend_log(), PropertyId::LogBuffer, 9000, 20, 2),
            ReadRangeRequest::by_time(
                trend_log(),
                PropertyId::LogBuffer,
                date,
                Time::hms(8, 30, 0),
                -100,
                3,
            ),
            ReadRangeRequest::read_all(trend_log(), PropertyId::LogBuffer, 4),
        ];
        for req in requests {
            let mut buf = [0u8; 64];
            let mut w = Writer::new(&mut buf);
            req.encode(&mut w).unwrap();
            assert_eq!(decode_request(w.as_written()), req);
        }
    }

    #[test]
    fn request_with_array_index_keeps_it() {
        let mut req = ReadRangeRequest::by_position(trend_log(), PropertyId::LogBuffer, 1, 2, 7);
        req.array_index = Some(3);
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        req.encode(&mut w).unwrap();
        assert_eq!(decode_request(w.as_written()).array_index, Some(3));
    }

    #[test]
    fn obsolete_time_range_decodes_as_unsupported() {
        // by-time-range [5]: two date/time pairs
        let bytes = [
            0x00, 0x05, 0x01, 0x1A, 0x0C, 0x05, 0x00, 0x00, 0x01, 0x19, 0x83, 0x5E, 0xA4, 125,
            1, 1, 3, 0xB4, 0, 0, 0, 0, 0xA4, 125, 1, 2, 4, 0xB4, 0, 0, 0, 0, 0x5F,
        ];
        let req = decode_request(&bytes);
        assert_eq!(req.range, ReadRangeSpecifier::Unsupported { choice: 5 });
        assert_eq!(req.property_id, PropertyId::LogBuffer);
    }

    #[test]
    fn unsupported_range_refuses_to_encode() {
        let mut req = ReadRangeRequest::read_all(trend_log(), PropertyId::LogBuffer, 1);
        req.range = ReadRangeSpecifier::Unsupported { choice: 4 };
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        assert!(req.encode(&mut w).is_err());
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn ack_roundtrips_with_records_and_sequence() {
        let stamp = DateTime::new(Date::from_ymd(2025, 3, 4).unwrap(), Time::hms(1, 2, 3));
        let ack = ReadRangeAck {
            object_id: trend_log(),
            property_id: PropertyId::LogBuffer,
            array_index: None,
            result_flags: ResultFlags::LAST_ITEM,
            item_count: 2,
            items: vec![
                LogRecord::new(stamp, LogDatum::Real(1.5), StatusFlags::empty()),
                LogRecord::new(stamp, LogDatum::Boolean(true), StatusFlags::IN_ALARM),
            ],
            first_sequence_number: Some(41),
        };
        let mut buf = [0u8; 128];
        let mut w = Writer::new(&mut buf);
        ack.encode(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        assert_eq!(ReadRangeAck::decode_after_header(&mut r).unwrap(), ack);
        assert!(r.is_empty());
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn empty_ack_omits_first_sequence() {
        let ack = ReadRangeAck {
            object_id: trend_log(),
            property_id: PropertyId::LogBuffer,
            array_index: None,
            result_flags: ResultFlags::FIRST_ITEM | ResultFlags::LAST_ITEM,
            item_count: 0,
            items: vec![],
            first_sequence_number: None,
        };
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        ack.encode(&mut w).unwrap();
        assert_eq!(
            w.as_written(),
            &[
                0x0C, 0x05, 0x00, 0x00, 0x01, 0x19, 0x83, 0x3A, 0x05, 0xC0, 0x49, 0x00, 0x5E,
                0x5F
            ]
        );
    }
}
