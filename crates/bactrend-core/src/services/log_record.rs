//! BACnetLogRecord, the item type of a trend log's log-buffer property.
//!
//! ```text
//! BACnetLogRecord ::= SEQUENCE {
//!     timestamp    [0] BACnetDateTime,
//!     log-datum    [1] CHOICE { log-status [0], boolean-value [1], real-value [2],
//!                               enumerated-value [3], unsigned-value [4],
//!                               signed-value [5], null-value [7], ... },
//!     status-flags [2] BACnetStatusFlags OPTIONAL
//! }
//! ```

use core::fmt;

use crate::encoding::{
    primitives::{
        decode_app_date, decode_app_time, decode_bit_string, decode_ctx_boolean, decode_real,
        decode_signed, decode_unsigned, encode_app_date, encode_app_time, encode_closing_tag,
        encode_ctx_boolean, encode_ctx_enumerated, encode_ctx_null, encode_ctx_real,
        encode_ctx_signed, encode_ctx_unsigned, encode_opening_tag, expect_closing_tag,
        expect_opening_tag,
    },
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::types::{DateTime, LogStatus, StatusFlags};
use crate::{DecodeError, EncodeError};

/// The value half of a log record. Each arm has exactly one wire form.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum LogDatum {
    LogStatus(LogStatus),
    Boolean(bool),
    Real(f32),
    Enumerated(u32),
    Unsigned(u32),
    Signed(i32),
    Null,
}

impl LogDatum {
    /// Context tag number of this arm inside the `[1]` choice.
    pub const fn choice_tag(&self) -> u8 {
        match self {
            Self::LogStatus(_) => 0,
            Self::Boolean(_) => 1,
            Self::Real(_) => 2,
            Self::Enumerated(_) => 3,
            Self::Unsigned(_) => 4,
            Self::Signed(_) => 5,
            Self::Null => 7,
        }
    }

    /// Numeric view for threshold comparisons and export; `None` for status and null.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Boolean(v) => Some(if v { 1.0 } else { 0.0 }),
            Self::Real(v) => Some(f64::from(v)),
            Self::Enumerated(v) | Self::Unsigned(v) => Some(f64::from(v)),
            Self::Signed(v) => Some(f64::from(v)),
            Self::LogStatus(_) | Self::Null => None,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let tag = self.choice_tag();
        match *self {
            Self::LogStatus(status) => status.encode_context(w, tag),
            Self::Boolean(v) => encode_ctx_boolean(w, tag, v),
            Self::Real(v) => encode_ctx_real(w, tag, v),
            Self::Enumerated(v) => encode_ctx_enumerated(w, tag, v),
            Self::Unsigned(v) => encode_ctx_unsigned(w, tag, v),
            Self::Signed(v) => encode_ctx_signed(w, tag, v),
            Self::Null => encode_ctx_null(w, tag),
        }
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let (tag_num, len) = match Tag::decode(r)? {
            Tag::Context { tag_num, len } => (tag_num, len as usize),
            _ => return Err(DecodeError::InvalidTag),
        };
        Ok(match tag_num {
            0 => Self::LogStatus(LogStatus::from_bit_string(decode_bit_string(r, len)?)),
            1 => Self::Boolean(decode_ctx_boolean(r, len)?),
            2 => Self::Real(decode_real(r, len)?),
            3 => Self::Enumerated(decode_unsigned(r, len)?),
            4 => Self::Unsigned(decode_unsigned(r, len)?),
            5 => Self::Signed(decode_signed(r, len)?),
            7 if len == 0 => Self::Null,
            7 => return Err(DecodeError::InvalidLength),
            other => return Err(DecodeError::UnknownChoice(other)),
        })
    }
}

impl fmt::Display for LogDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogStatus(s) => write!(f, "status:{:#04x}", s.to_octet()),
            Self::Boolean(v) => write!(f, "{}", u8::from(*v)),
            Self::Real(v) => write!(f, "{v:.2}"),
            Self::Enumerated(v) | Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogRecord {
    pub timestamp: DateTime,
    pub datum: LogDatum,
    pub status_flags: StatusFlags,
}

impl LogRecord {
    pub const fn new(timestamp: DateTime, datum: LogDatum, status_flags: StatusFlags) -> Self {
        Self {
            timestamp,
            datum,
            status_flags,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_opening_tag(w, 0)?;
        encode_app_date(w, self.timestamp.date)?;
        encode_app_time(w, self.timestamp.time)?;
        encode_closing_tag(w, 0)?;

        encode_opening_tag(w, 1)?;
        self.datum.encode(w)?;
        encode_closing_tag(w, 1)?;

        self.status_flags.encode_context(w, 2)
    }

    /// Decodes one record. Absent status flags read as all clear.
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        expect_opening_tag(r, 0)?;
        let date = decode_app_date(r)?;
        let time = decode_app_time(r)?;
        expect_closing_tag(r, 0)?;

        expect_opening_tag(r, 1)?;
        let datum = LogDatum::decode(r)?;
        expect_closing_tag(r, 1)?;

        let status_flags = if r.is_empty() {
            StatusFlags::empty()
        } else {
            match Tag::peek(r)? {
                Tag::Context { tag_num: 2, len } => {
                    Tag::decode(r)?;
                    StatusFlags::from_bit_string(decode_bit_string(r, len as usize)?)
                }
                _ => StatusFlags::empty(),
            }
        };

        Ok(Self {
            timestamp: DateTime::new(date, time),
            datum,
            status_flags,
        })
    }
}
