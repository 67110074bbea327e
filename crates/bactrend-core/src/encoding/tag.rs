use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

const CONTEXT_CLASS: u8 = 0x08;
const EXTENDED_NUMBER: u8 = 0x0F;
const EXTENDED_LENGTH: u8 = 5;
const OPENING: u8 = 6;
const CLOSING: u8 = 7;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectId = 12,
}

impl AppTag {
    const BY_NUMBER: [AppTag; 13] = [
        Self::Null,
        Self::Boolean,
        Self::UnsignedInt,
        Self::SignedInt,
        Self::Real,
        Self::Double,
        Self::OctetString,
        Self::CharacterString,
        Self::BitString,
        Self::Enumerated,
        Self::Date,
        Self::Time,
        Self::ObjectId,
    ];

    /// Application tag numbers 13..=15 are reserved.
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        Self::BY_NUMBER
            .get(usize::from(value))
            .copied()
            .ok_or(DecodeError::InvalidTag)
    }
}

/// One BACnet tag header. `len` is the content length in octets, except for
/// an application Boolean where it carries the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Application { tag: AppTag, len: u32 },
    Context { tag_num: u8, len: u32 },
    Opening { tag_num: u8 },
    Closing { tag_num: u8 },
}

impl Tag {
    pub fn encode(self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Tag::Application { tag, len } => write_sized(w, tag as u8, 0, len),
            Tag::Context { tag_num, len } => write_sized(w, tag_num, CONTEXT_CLASS, len),
            Tag::Opening { tag_num } => write_initial(w, tag_num, CONTEXT_CLASS | OPENING),
            Tag::Closing { tag_num } => write_initial(w, tag_num, CONTEXT_CLASS | CLOSING),
        }
    }

    /// Decodes the next tag without advancing `r`.
    pub fn peek(r: &Reader<'_>) -> Result<Self, DecodeError> {
        let mut lookahead = *r;
        Self::decode(&mut lookahead)
    }

    pub const fn is_closing(self, expected: u8) -> bool {
        matches!(self, Tag::Closing { tag_num } if tag_num == expected)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let initial = r.read_u8()?;
        let number = match initial >> 4 {
            EXTENDED_NUMBER => r.read_u8()?,
            n => n,
        };
        let lvt = initial & 0x07;

        if initial & CONTEXT_CLASS == 0 {
            return Ok(Tag::Application {
                tag: AppTag::from_u8(number)?,
                len: read_length(r, lvt)?,
            });
        }
        Ok(match lvt {
            OPENING => Tag::Opening { tag_num: number },
            CLOSING => Tag::Closing { tag_num: number },
            _ => Tag::Context {
                tag_num: number,
                len: read_length(r, lvt)?,
            },
        })
    }
}

/// Writes the initial octet, plus the extended tag number when it does not
/// fit in four bits.
fn write_initial(w: &mut Writer<'_>, number: u8, low_bits: u8) -> Result<(), EncodeError> {
    if number < EXTENDED_NUMBER {
        w.write_u8((number << 4) | low_bits)
    } else {
        w.write_u8((EXTENDED_NUMBER << 4) | low_bits)?;
        w.write_u8(number)
    }
}

fn write_sized(w: &mut Writer<'_>, number: u8, class: u8, len: u32) -> Result<(), EncodeError> {
    if len < u32::from(EXTENDED_LENGTH) {
        return write_initial(w, number, class | len as u8);
    }
    write_initial(w, number, class | EXTENDED_LENGTH)?;
    match len {
        0..=253 => w.write_u8(len as u8),
        254..=0xFFFF => {
            w.write_u8(254)?;
            w.write_be_u16(len as u16)
        }
        _ => {
            w.write_u8(255)?;
            w.write_be_u32(len)
        }
    }
}

fn read_length(r: &mut Reader<'_>, lvt: u8) -> Result<u32, DecodeError> {
    match lvt {
        0..=4 => Ok(u32::from(lvt)),
        EXTENDED_LENGTH => match r.read_u8()? {
            254 => r.read_be_u16().map(u32::from),
            255 => r.read_be_u32(),
            short => Ok(u32::from(short)),
        },
        _ => Err(DecodeError::InvalidLength),
    }
}
