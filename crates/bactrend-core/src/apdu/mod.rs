//! Application layer PDUs. The PDU type sits in the high nibble of the
//! first octet.

pub mod confirmed;

pub use confirmed::{
    AbortPdu, BacnetError, ComplexAckHeader, ConfirmedRequestHeader, RejectPdu, Segment,
    ABORT_SEGMENTATION_NOT_SUPPORTED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

impl ApduType {
    const ALL: [ApduType; 8] = [
        Self::ConfirmedRequest,
        Self::UnconfirmedRequest,
        Self::SimpleAck,
        Self::ComplexAck,
        Self::SegmentAck,
        Self::Error,
        Self::Reject,
        Self::Abort,
    ];

    /// `value` is the already shifted nibble; 8..=15 are reserved.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// The first octet's high nibble for this PDU type.
    pub const fn type_bits(self) -> u8 {
        (self as u8) << 4
    }
}

#[cfg(test)]
mod tests {
    use super::ApduType;

    #[test]
    fn nibble_mapping() {
        assert_eq!(ApduType::from_u8(0x30 >> 4), Some(ApduType::ComplexAck));
        assert_eq!(ApduType::from_u8(8), None);
        assert_eq!(ApduType::Reject.type_bits(), 0x60);
    }
}
