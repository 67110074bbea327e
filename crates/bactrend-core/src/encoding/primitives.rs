//! Primitive values behind application and context tags.
//!
//! Integers use the shortest content that holds the value; every other
//! primitive here has a fixed content length.

use crate::encoding::{
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::types::{BitString, Date, Time};
use crate::{DecodeError, EncodeError};

const CHARSET_UTF8: u8 = 0;

/// Up to four big-endian content octets, starting at `start`.
struct Octets {
    buf: [u8; 4],
    start: usize,
}

impl Octets {
    fn unsigned(value: u32) -> Self {
        let zeros = (value.leading_zeros() / 8).min(3);
        Self {
            buf: value.to_be_bytes(),
            start: zeros as usize,
        }
    }

    /// Drops leading octets that only repeat the sign.
    fn signed(value: i32) -> Self {
        let buf = value.to_be_bytes();
        let mut start = 0;
        while start < 3 {
            let next_negative = buf[start + 1] & 0x80 != 0;
            match buf[start] {
                0x00 if !next_negative => start += 1,
                0xFF if next_negative => start += 1,
                _ => break,
            }
        }
        Self { buf, start }
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

fn write_app(w: &mut Writer<'_>, tag: AppTag, content: &[u8]) -> Result<(), EncodeError> {
    Tag::Application {
        tag,
        len: content.len() as u32,
    }
    .encode(w)?;
    w.write_all(content)
}

fn write_ctx(w: &mut Writer<'_>, tag_num: u8, content: &[u8]) -> Result<(), EncodeError> {
    Tag::Context {
        tag_num,
        len: content.len() as u32,
    }
    .encode(w)?;
    w.write_all(content)
}

/// Reads an application tag that must be `expected`, returning its length.
fn app_len(r: &mut Reader<'_>, expected: AppTag) -> Result<usize, DecodeError> {
    match Tag::decode(r)? {
        Tag::Application { tag, len } if tag == expected => Ok(len as usize),
        _ => Err(DecodeError::InvalidTag),
    }
}

fn bit_string_len(value: BitString<'_>) -> Result<u32, EncodeError> {
    if value.unused_bits > 7 {
        return Err(EncodeError::ValueOutOfRange);
    }
    u32::try_from(value.data.len() + 1).map_err(|_| EncodeError::ValueOutOfRange)
}

fn integer_content<'a>(r: &mut Reader<'a>, len: usize) -> Result<&'a [u8], DecodeError> {
    if !(1..=4).contains(&len) {
        return Err(DecodeError::InvalidLength);
    }
    r.read_exact(len)
}

fn four_octets(r: &mut Reader<'_>, len: usize) -> Result<[u8; 4], DecodeError> {
    if len != 4 {
        return Err(DecodeError::InvalidLength);
    }
    let mut out = [0u8; 4];
    out.copy_from_slice(r.read_exact(4)?);
    Ok(out)
}

pub fn decode_unsigned(r: &mut Reader<'_>, len: usize) -> Result<u32, DecodeError> {
    let content = integer_content(r, len)?;
    Ok(content
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
}

pub fn decode_signed(r: &mut Reader<'_>, len: usize) -> Result<i32, DecodeError> {
    let content = integer_content(r, len)?;
    let sign = if content[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(sign, |acc: i32, b| (acc << 8) | i32::from(*b)))
}

pub fn decode_real(r: &mut Reader<'_>, len: usize) -> Result<f32, DecodeError> {
    four_octets(r, len).map(f32::from_be_bytes)
}

pub fn decode_bit_string<'a>(r: &mut Reader<'a>, len: usize) -> Result<BitString<'a>, DecodeError> {
    if len == 0 {
        return Err(DecodeError::InvalidLength);
    }
    let (unused, data) = r.read_exact(len)?.split_at(1);
    match unused[0] {
        unused_bits @ 0..=7 => Ok(BitString::new(unused_bits, data)),
        _ => Err(DecodeError::InvalidValue),
    }
}

/// Context booleans carry one content octet, unlike the application form
/// which packs the value into the tag.
pub fn decode_ctx_boolean(r: &mut Reader<'_>, len: usize) -> Result<bool, DecodeError> {
    match len {
        1 => Ok(r.read_u8()? != 0),
        _ => Err(DecodeError::InvalidLength),
    }
}

pub fn encode_app_unsigned(w: &mut Writer<'_>, value: u32) -> Result<(), EncodeError> {
    write_app(w, AppTag::UnsignedInt, Octets::unsigned(value).as_slice())
}

pub fn encode_app_enumerated(w: &mut Writer<'_>, value: u32) -> Result<(), EncodeError> {
    write_app(w, AppTag::Enumerated, Octets::unsigned(value).as_slice())
}

pub fn encode_app_signed(w: &mut Writer<'_>, value: i32) -> Result<(), EncodeError> {
    write_app(w, AppTag::SignedInt, Octets::signed(value).as_slice())
}

pub fn encode_app_date(w: &mut Writer<'_>, date: Date) -> Result<(), EncodeError> {
    write_app(
        w,
        AppTag::Date,
        &[date.year_since_1900, date.month, date.day, date.weekday],
    )
}

pub fn encode_app_time(w: &mut Writer<'_>, time: Time) -> Result<(), EncodeError> {
    write_app(
        w,
        AppTag::Time,
        &[time.hour, time.minute, time.second, time.hundredths],
    )
}

pub fn encode_app_real(w: &mut Writer<'_>, value: f32) -> Result<(), EncodeError> {
    write_app(w, AppTag::Real, &value.to_be_bytes())
}

/// The value rides in the tag's length field; there is no content octet.
pub fn encode_app_boolean(w: &mut Writer<'_>, value: bool) -> Result<(), EncodeError> {
    Tag::Application {
        tag: AppTag::Boolean,
        len: u32::from(value),
    }
    .encode(w)
}

pub fn encode_app_object_id(w: &mut Writer<'_>, object_id_raw: u32) -> Result<(), EncodeError> {
    write_app(w, AppTag::ObjectId, &object_id_raw.to_be_bytes())
}

pub fn encode_app_bit_string(w: &mut Writer<'_>, value: BitString<'_>) -> Result<(), EncodeError> {
    let len = bit_string_len(value)?;
    Tag::Application {
        tag: AppTag::BitString,
        len,
    }
    .encode(w)?;
    w.write_u8(value.unused_bits)?;
    w.write_all(value.data)
}

/// Character set 0 (UTF-8).
pub fn encode_app_character_string(w: &mut Writer<'_>, value: &str) -> Result<(), EncodeError> {
    let len = u32::try_from(value.len() + 1).map_err(|_| EncodeError::ValueOutOfRange)?;
    Tag::Application {
        tag: AppTag::CharacterString,
        len,
    }
    .encode(w)?;
    w.write_u8(CHARSET_UTF8)?;
    w.write_all(value.as_bytes())
}

pub fn decode_character_string<'a>(r: &mut Reader<'a>, len: usize) -> Result<&'a str, DecodeError> {
    if len == 0 {
        return Err(DecodeError::InvalidLength);
    }
    let (charset, text) = r.read_exact(len)?.split_at(1);
    if charset[0] != CHARSET_UTF8 {
        return Err(DecodeError::InvalidValue);
    }
    core::str::from_utf8(text).map_err(|_| DecodeError::InvalidValue)
}

pub fn decode_app_unsigned(r: &mut Reader<'_>) -> Result<u32, DecodeError> {
    let len = app_len(r, AppTag::UnsignedInt)?;
    decode_unsigned(r, len)
}

pub fn decode_app_signed(r: &mut Reader<'_>) -> Result<i32, DecodeError> {
    let len = app_len(r, AppTag::SignedInt)?;
    decode_signed(r, len)
}

pub fn decode_app_date(r: &mut Reader<'_>) -> Result<Date, DecodeError> {
    let len = app_len(r, AppTag::Date)?;
    let [year_since_1900, month, day, weekday] = four_octets(r, len)?;
    Ok(Date {
        year_since_1900,
        month,
        day,
        weekday,
    })
}

pub fn decode_app_time(r: &mut Reader<'_>) -> Result<Time, DecodeError> {
    let len = app_len(r, AppTag::Time)?;
    let [hour, minute, second, hundredths] = four_octets(r, len)?;
    Ok(Time {
        hour,
        minute,
        second,
        hundredths,
    })
}

pub fn encode_ctx_unsigned(w: &mut Writer<'_>, tag_num: u8, value: u32) -> Result<(), EncodeError> {
    write_ctx(w, tag_num, Octets::unsigned(value).as_slice())
}

pub fn encode_ctx_enumerated(
    w: &mut Writer<'_>,
    tag_num: u8,
    value: u32,
) -> Result<(), EncodeError> {
    encode_ctx_unsigned(w, tag_num, value)
}

pub fn encode_ctx_signed(w: &mut Writer<'_>, tag_num: u8, value: i32) -> Result<(), EncodeError> {
    write_ctx(w, tag_num, Octets::signed(value).as_slice())
}

pub fn encode_ctx_object_id(
    w: &mut Writer<'_>,
    tag_num: u8,
    object_id_raw: u32,
) -> Result<(), EncodeError> {
    write_ctx(w, tag_num, &object_id_raw.to_be_bytes())
}

pub fn encode_ctx_real(w: &mut Writer<'_>, tag_num: u8, value: f32) -> Result<(), EncodeError> {
    write_ctx(w, tag_num, &value.to_be_bytes())
}

pub fn encode_ctx_boolean(w: &mut Writer<'_>, tag_num: u8, value: bool) -> Result<(), EncodeError> {
    write_ctx(w, tag_num, &[u8::from(value)])
}

pub fn encode_ctx_null(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    write_ctx(w, tag_num, &[])
}

pub fn encode_ctx_bit_string(
    w: &mut Writer<'_>,
    tag_num: u8,
    value: BitString<'_>,
) -> Result<(), EncodeError> {
    let len = bit_string_len(value)?;
    Tag::Context { tag_num, len }.encode(w)?;
    w.write_u8(value.unused_bits)?;
    w.write_all(value.data)
}

pub fn encode_opening_tag(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    Tag::Opening { tag_num }.encode(w)
}

pub fn encode_closing_tag(w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
    Tag::Closing { tag_num }.encode(w)
}

pub fn expect_opening_tag(r: &mut Reader<'_>, tag_num: u8) -> Result<(), DecodeError> {
    match Tag::decode(r)? {
        Tag::Opening { tag_num: got } if got == tag_num => Ok(()),
        _ => Err(DecodeError::InvalidTag),
    }
}

pub fn expect_closing_tag(r: &mut Reader<'_>, tag_num: u8) -> Result<(), DecodeError> {
    if Tag::decode(r)?.is_closing(tag_num) {
        Ok(())
    } else {
        Err(DecodeError::InvalidTag)
    }
}
