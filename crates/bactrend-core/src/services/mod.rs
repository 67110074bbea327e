//! Confirmed-service codecs: ReadRange with the BACnetLogRecord it returns,
//! and ReadProperty.

pub mod log_record;
pub mod read_property;
pub mod read_range;

use crate::encoding::{primitives::decode_unsigned, reader::Reader, tag::Tag};
use crate::types::ObjectId;
use crate::DecodeError;

/// Reads a context tag that must be `[number]` and returns its length.
pub(crate) fn context_len(r: &mut Reader<'_>, number: u8) -> Result<usize, DecodeError> {
    match Tag::decode(r)? {
        Tag::Context { tag_num, len } if tag_num == number => Ok(len as usize),
        _ => Err(DecodeError::InvalidTag),
    }
}

pub(crate) fn decode_ctx_unsigned(r: &mut Reader<'_>, number: u8) -> Result<u32, DecodeError> {
    let len = context_len(r, number)?;
    decode_unsigned(r, len)
}

/// Like [`decode_ctx_unsigned`], but absent fields (a different tag next,
/// or end of input) read as `None` without consuming anything.
pub(crate) fn decode_ctx_unsigned_opt(
    r: &mut Reader<'_>,
    number: u8,
) -> Result<Option<u32>, DecodeError> {
    if r.is_empty() {
        return Ok(None);
    }
    match Tag::peek(r)? {
        Tag::Context { tag_num, .. } if tag_num == number => {
            decode_ctx_unsigned(r, number).map(Some)
        }
        _ => Ok(None),
    }
}

pub(crate) fn decode_ctx_object_id(r: &mut Reader<'_>, number: u8) -> Result<ObjectId, DecodeError> {
    match context_len(r, number)? {
        4 => Ok(ObjectId::from_raw(r.read_be_u32()?)),
        _ => Err(DecodeError::InvalidLength),
    }
}
