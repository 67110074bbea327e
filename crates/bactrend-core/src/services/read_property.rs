//! ReadProperty, for the scalar properties of trend logs and the points they
//! sample.
//!
//! ```text
//! ReadProperty-Request ::= SEQUENCE {
//!     objectIdentifier   [0] BACnetObjectIdentifier,
//!     propertyIdentifier [1] BACnetPropertyIdentifier,
//!     propertyArrayIndex [2] Unsigned OPTIONAL
//! }
//! ReadProperty-ACK ::= SEQUENCE {
//!     objectIdentifier   [0] BACnetObjectIdentifier,
//!     propertyIdentifier [1] BACnetPropertyIdentifier,
//!     propertyArrayIndex [2] Unsigned OPTIONAL,
//!     propertyValue      [3] ABSTRACT-SYNTAX.&Type
//! }
//! ```

use crate::apdu::ConfirmedRequestHeader;
use crate::encoding::{
    primitives::{
        decode_bit_string, decode_character_string, decode_real, decode_unsigned,
        encode_app_bit_string, encode_app_boolean, encode_app_character_string,
        encode_app_enumerated, encode_app_object_id, encode_app_real, encode_app_unsigned,
        encode_closing_tag, encode_ctx_object_id, encode_ctx_unsigned, encode_opening_tag,
        expect_closing_tag, expect_opening_tag,
    },
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::services::{decode_ctx_object_id, decode_ctx_unsigned, decode_ctx_unsigned_opt};
use crate::types::{BitString, ObjectId, PropertyId, StatusFlags};
use crate::{DecodeError, EncodeError};

pub const SERVICE_READ_PROPERTY: u8 = 0x0C;

/// An application-tagged property value.
///
/// `StatusFlags` is a convenience for the encoder: it goes out as a four-bit
/// bit string and comes back as `BitString`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue<'a> {
    Boolean(bool),
    Unsigned(u32),
    Real(f32),
    Enumerated(u32),
    CharacterString(&'a str),
    BitString(BitString<'a>),
    StatusFlags(StatusFlags),
    ObjectId(ObjectId),
}

impl<'a> PropertyValue<'a> {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match *self {
            Self::Boolean(v) => encode_app_boolean(w, v),
            Self::Unsigned(v) => encode_app_unsigned(w, v),
            Self::Real(v) => encode_app_real(w, v),
            Self::Enumerated(v) => encode_app_enumerated(w, v),
            Self::CharacterString(v) => encode_app_character_string(w, v),
            Self::BitString(v) => encode_app_bit_string(w, v),
            Self::StatusFlags(flags) => {
                let octet = [flags.to_octet()];
                encode_app_bit_string(w, BitString::new(8 - StatusFlags::BIT_COUNT, &octet))
            }
            Self::ObjectId(id) => encode_app_object_id(w, id.raw()),
        }
    }

    pub fn decode(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let Tag::Application { tag, len } = Tag::decode(r)? else {
            return Err(DecodeError::InvalidTag);
        };
        let len = len as usize;
        Ok(match tag {
            AppTag::Boolean => Self::Boolean(len != 0),
            AppTag::UnsignedInt => Self::Unsigned(decode_unsigned(r, len)?),
            AppTag::Real => Self::Real(decode_real(r, len)?),
            AppTag::Enumerated => Self::Enumerated(decode_unsigned(r, len)?),
            AppTag::CharacterString => Self::CharacterString(decode_character_string(r, len)?),
            AppTag::BitString => Self::BitString(decode_bit_string(r, len)?),
            AppTag::ObjectId if len == 4 => Self::ObjectId(ObjectId::from_raw(r.read_be_u32()?)),
            _ => return Err(DecodeError::InvalidTag),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPropertyRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub invoke_id: u8,
}

impl ReadPropertyRequest {
    pub const fn new(object_id: ObjectId, property_id: PropertyId, invoke_id: u8) -> Self {
        Self {
            object_id,
            property_id,
            array_index: None,
            invoke_id,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        ConfirmedRequestHeader::new(self.invoke_id, SERVICE_READ_PROPERTY).encode(w)?;
        self.encode_service(w)
    }

    pub fn encode_service(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            encode_ctx_unsigned(w, 2, index)?;
        }
        Ok(())
    }

    pub fn decode_after_header(r: &mut Reader<'_>, invoke_id: u8) -> Result<Self, DecodeError> {
        Ok(Self {
            object_id: decode_ctx_object_id(r, 0)?,
            property_id: PropertyId::from_u32(decode_ctx_unsigned(r, 1)?),
            array_index: decode_ctx_unsigned_opt(r, 2)?,
            invoke_id,
        })
    }
}

/// ReadProperty-ACK service parameters, without the Complex-ACK header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadPropertyAck<'a> {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: PropertyValue<'a>,
}

impl<'a> ReadPropertyAck<'a> {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(index) = self.array_index {
            encode_ctx_unsigned(w, 2, index)?;
        }
        encode_opening_tag(w, 3)?;
        self.value.encode(w)?;
        encode_closing_tag(w, 3)
    }

    pub fn decode_after_header(r: &mut Reader<'a>) -> Result<Self, DecodeError> {
        let object_id = decode_ctx_object_id(r, 0)?;
        let property_id = PropertyId::from_u32(decode_ctx_unsigned(r, 1)?);
        let array_index = decode_ctx_unsigned_opt(r, 2)?;
        expect_opening_tag(r, 3)?;
        let value = PropertyValue::decode(r)?;
        expect_closing_tag(r, 3)?;
        Ok(Self {
            object_id,
            property_id,
            array_index,
            value,
        })
    }
}
