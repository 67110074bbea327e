use crate::apdu::ApduType;
use crate::encoding::{
    primitives::{decode_unsigned, encode_app_enumerated},
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::types::{ErrorClass, ErrorCode, RejectReason};
use crate::{DecodeError, EncodeError};

const SEGMENTED: u8 = 0x08;
const MORE_FOLLOWS: u8 = 0x04;
const SEGMENTED_RESPONSE_ACCEPTED: u8 = 0x02;
const FROM_SERVER: u8 = 0x01;

/// Reads the first octet and checks its type nibble, returning the flag bits.
fn read_type(r: &mut Reader<'_>, expected: ApduType) -> Result<u8, DecodeError> {
    let first = r.read_u8()?;
    if first & 0xF0 != expected.type_bits() {
        return Err(DecodeError::InvalidValue);
    }
    Ok(first & 0x0F)
}

fn flag(set: bool, bit: u8) -> u8 {
    if set {
        bit
    } else {
        0
    }
}

/// Present in a header exactly when the PDU is one segment of a larger
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub sequence_number: u8,
    pub window_size: u8,
    pub more_follows: bool,
}

impl Segment {
    fn flags(segment: Option<Segment>) -> u8 {
        match segment {
            Some(s) => SEGMENTED | flag(s.more_follows, MORE_FOLLOWS),
            None => 0,
        }
    }

    fn read(r: &mut Reader<'_>, flags: u8) -> Result<Option<Self>, DecodeError> {
        if flags & SEGMENTED == 0 {
            return Ok(None);
        }
        Ok(Some(Self {
            sequence_number: r.read_u8()?,
            window_size: r.read_u8()?,
            more_follows: flags & MORE_FOLLOWS != 0,
        }))
    }

    fn write(segment: Option<Segment>, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match segment {
            Some(s) => w.write_all(&[s.sequence_number, s.window_size]),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedRequestHeader {
    pub segment: Option<Segment>,
    pub segmented_response_accepted: bool,
    pub max_segments: u8,
    /// Max-APDU-length-accepted code; see [`Self::max_apdu_len`].
    pub max_apdu: u8,
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl ConfirmedRequestHeader {
    /// Unsegmented request advertising the largest APDU size code.
    pub const fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segment: None,
            segmented_response_accepted: false,
            max_segments: 0,
            max_apdu: 5,
            invoke_id,
            service_choice,
        }
    }

    pub const fn is_segmented(&self) -> bool {
        self.segment.is_some()
    }

    /// Octet length for the max-APDU code. Codes above 5 are reserved and
    /// read as 1476.
    pub const fn max_apdu_len(&self) -> usize {
        const LENGTHS: [usize; 6] = [50, 128, 206, 480, 1024, 1476];
        if (self.max_apdu as usize) < LENGTHS.len() {
            LENGTHS[self.max_apdu as usize]
        } else {
            1476
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let flags = Segment::flags(self.segment)
            | flag(self.segmented_response_accepted, SEGMENTED_RESPONSE_ACCEPTED);
        w.write_all(&[
            ApduType::ConfirmedRequest.type_bits() | flags,
            (self.max_segments << 4) | (self.max_apdu & 0x0F),
            self.invoke_id,
        ])?;
        Segment::write(self.segment, w)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_type(r, ApduType::ConfirmedRequest)?;
        let sizes = r.read_u8()?;
        Ok(Self {
            segmented_response_accepted: flags & SEGMENTED_RESPONSE_ACCEPTED != 0,
            max_segments: sizes >> 4,
            max_apdu: sizes & 0x0F,
            invoke_id: r.read_u8()?,
            segment: Segment::read(r, flags)?,
            service_choice: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexAckHeader {
    pub segment: Option<Segment>,
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl ComplexAckHeader {
    pub const fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segment: None,
            invoke_id,
            service_choice,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let first = ApduType::ComplexAck.type_bits() | Segment::flags(self.segment);
        w.write_all(&[first, self.invoke_id])?;
        Segment::write(self.segment, w)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_type(r, ApduType::ComplexAck)?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            segment: Segment::read(r, flags)?,
            service_choice: r.read_u8()?,
        })
    }
}

/// Error PDU. Class and code are kept as raw numbers so unnamed values
/// survive decoding; [`BacnetError::class`] and [`BacnetError::code`] give
/// the typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacnetError {
    pub invoke_id: u8,
    pub service_choice: u8,
    pub error_class: Option<u32>,
    pub error_code: Option<u32>,
}

impl BacnetError {
    pub const fn new(
        invoke_id: u8,
        service_choice: u8,
        class: ErrorClass,
        code: ErrorCode,
    ) -> Self {
        Self {
            invoke_id,
            service_choice,
            error_class: Some(class.to_u32()),
            error_code: Some(code.to_u32()),
        }
    }

    pub fn class(&self) -> Option<ErrorClass> {
        self.error_class.and_then(ErrorClass::from_u32)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.error_code.and_then(ErrorCode::from_u32)
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_all(&[
            ApduType::Error.type_bits(),
            self.invoke_id,
            self.service_choice,
        ])?;
        let (Some(class), Some(code)) = (self.error_class, self.error_code) else {
            return Ok(());
        };
        encode_app_enumerated(w, class)?;
        encode_app_enumerated(w, code)
    }

    /// Accepts the plain application-enumerated pair, a context-tagged
    /// pair, and either wrapped in an opening/closing [0].
    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        read_type(r, ApduType::Error)?;
        let mut err = Self {
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
            error_class: None,
            error_code: None,
        };
        if r.is_empty() {
            return Ok(err);
        }

        let mut tag = Tag::decode(r)?;
        let wrapped = tag == Tag::Opening { tag_num: 0 };
        if wrapped {
            tag = Tag::decode(r)?;
        }
        err.error_class = Some(read_error_field(r, tag, 0)?);
        let tag = Tag::decode(r)?;
        err.error_code = Some(read_error_field(r, tag, 1)?);
        if wrapped && !Tag::decode(r)?.is_closing(0) {
            return Err(DecodeError::InvalidTag);
        }
        Ok(err)
    }
}

fn read_error_field(r: &mut Reader<'_>, tag: Tag, context: u8) -> Result<u32, DecodeError> {
    let len = match tag {
        Tag::Context { tag_num, len } if tag_num == context => len,
        Tag::Application {
            tag: AppTag::Enumerated,
            len,
        } => len,
        _ => return Err(DecodeError::InvalidTag),
    };
    decode_unsigned(r, len as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectPdu {
    pub invoke_id: u8,
    pub reason: u8,
}

impl RejectPdu {
    pub const fn new(invoke_id: u8, reason: RejectReason) -> Self {
        Self {
            invoke_id,
            reason: reason.to_u8(),
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_all(&[ApduType::Reject.type_bits(), self.invoke_id, self.reason])
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        read_type(r, ApduType::Reject)?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            reason: r.read_u8()?,
        })
    }
}

/// BACnetAbortReason segmentation-not-supported.
pub const ABORT_SEGMENTATION_NOT_SUPPORTED: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortPdu {
    pub server: bool,
    pub invoke_id: u8,
    pub reason: u8,
}

impl AbortPdu {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let first = ApduType::Abort.type_bits() | flag(self.server, FROM_SERVER);
        w.write_all(&[first, self.invoke_id, self.reason])
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let flags = read_type(r, ApduType::Abort)?;
        Ok(Self {
            server: flags & FROM_SERVER != 0,
            invoke_id: r.read_u8()?,
            reason: r.read_u8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AbortPdu, BacnetError, ConfirmedRequestHeader, RejectPdu, Segment};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ErrorClass, ErrorCode, RejectReason};

    #[test]
    fn bacnet_error_decodes_without_details() {
        let mut r = Reader::new(&[0x50, 1, 26]);
        let e = BacnetError::decode(&mut r).unwrap();
        assert_eq!(e.invoke_id, 1);
        assert_eq!(e.service_choice, 26);
        assert_eq!(e.error_class, None);
        assert_eq!(e.error_code, None);
    }

    #[test]
    fn bacnet_error_decodes_context_details() {
        let mut r = Reader::new(&[0x50, 1, 26, 0x09, 0x02, 0x19, 0x16]);
        let e = BacnetError::decode(&mut r).unwrap();
        assert_eq!(e.class(), Some(ErrorClass::Property));
        assert_eq!(e.code(), Some(ErrorCode::PropertyIsNotAList));
    }

    #[test]
    fn bacnet_error_decodes_opening_wrapped_application_details() {
        let mut r = Reader::new(&[0x50, 1, 26, 0x0E, 0x91, 0x02, 0x91, 0x20, 0x0F]);
        let e = BacnetError::decode(&mut r).unwrap();
        assert_eq!(e.error_class, Some(2));
        assert_eq!(e.error_code, Some(32));
    }

    #[test]
    fn bacnet_error_encodes_application_enumerations() {
        let err = BacnetError::new(7, 0x1A, ErrorClass::Property, ErrorCode::InvalidArrayIndex);
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        err.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x50, 7, 0x1A, 0x91, 0x02, 0x91, 0x2A]);

        let mut r = Reader::new(w.as_written());
        assert_eq!(BacnetError::decode(&mut r).unwrap(), err);
    }

    #[test]
    fn reject_and_abort_encode() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        RejectPdu::new(3, RejectReason::UnrecognizedService)
            .encode(&mut w)
            .unwrap();
        assert_eq!(w.as_written(), &[0x60, 3, 9]);

        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        AbortPdu {
            server: true,
            invoke_id: 3,
            reason: super::ABORT_SEGMENTATION_NOT_SUPPORTED,
        }
        .encode(&mut w)
        .unwrap();
        assert_eq!(w.as_written(), &[0x71, 3, 4]);
    }

    #[test]
    fn segmented_request_header() {
        let mut r = Reader::new(&[0x0C, 0x05, 0x11, 0x00, 0x01, 0x1A]);
        let h = ConfirmedRequestHeader::decode(&mut r).unwrap();
        assert!(h.is_segmented());
        assert_eq!(
            h.segment,
            Some(Segment {
                sequence_number: 0,
                window_size: 1,
                more_follows: true,
            })
        );
        assert_eq!(h.service_choice, 0x1A);
        assert!(r.is_empty());

        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        h.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x0C, 0x05, 0x11, 0x00, 0x01, 0x1A]);
    }

    #[test]
    fn wrong_pdu_type_is_rejected() {
        let mut r = Reader::new(&[0x30, 0x01, 0x1A]);
        assert_eq!(
            ConfirmedRequestHeader::decode(&mut r),
            Err(crate::DecodeError::InvalidValue)
        );
    }

    #[test]
    fn max_apdu_code_maps_to_length() {
        let mut h = ConfirmedRequestHeader::new(1, 0x1A);
        assert_eq!(h.max_apdu_len(), 1476);
        h.max_apdu = 0;
        assert_eq!(h.max_apdu_len(), 50);
        h.max_apdu = 9;
        assert_eq!(h.max_apdu_len(), 1476);
    }
}
