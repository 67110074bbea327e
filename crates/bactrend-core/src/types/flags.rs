//! Fixed-width BACnet bit strings used by trend logs.
//!
//! BACnet numbers bit-string bits from the most significant bit of the first
//! content octet, so flag bit `n` is transmitted as `0x80 >> n`.

use crate::encoding::{primitives::encode_ctx_bit_string, writer::Writer};
use crate::EncodeError;
use bitflags::bitflags;

/// Raw bit-string content as it appears on the wire: the count of unused
/// trailing bits, then the data octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitString<'a> {
    pub unused_bits: u8,
    pub data: &'a [u8],
}

impl<'a> BitString<'a> {
    pub const fn new(unused_bits: u8, data: &'a [u8]) -> Self {
        Self { unused_bits, data }
    }
}

bitflags! {
    /// BACnetStatusFlags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StatusFlags: u8 {
        const IN_ALARM = 1 << 0;
        const FAULT = 1 << 1;
        const OVERRIDDEN = 1 << 2;
        const OUT_OF_SERVICE = 1 << 3;
    }
}

bitflags! {
    /// BACnetResultFlags returned by ReadRange.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ResultFlags: u8 {
        const FIRST_ITEM = 1 << 0;
        const LAST_ITEM = 1 << 1;
        const MORE_ITEMS = 1 << 2;
    }
}

bitflags! {
    /// BACnetLogStatus, recorded as a log datum when a log changes state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LogStatus: u8 {
        const LOG_DISABLED = 1 << 0;
        const BUFFER_PURGED = 1 << 1;
        const LOG_INTERRUPTED = 1 << 2;
    }
}

macro_rules! wire_bits {
    ($ty:ty, $count:expr) => {
        impl $ty {
            /// Number of significant bits on the wire.
            pub const BIT_COUNT: u8 = $count;

            /// Packs the flags MSB-first into a single content octet.
            pub fn to_octet(self) -> u8 {
                let mut out = 0u8;
                for bit in 0..Self::BIT_COUNT {
                    if self.bits() & (1 << bit) != 0 {
                        out |= 0x80 >> bit;
                    }
                }
                out
            }

            /// Unpacks a received bit string. Missing bits read as clear and
            /// bits beyond [`Self::BIT_COUNT`] are ignored.
            pub fn from_bit_string(value: BitString<'_>) -> Self {
                let octet = value.data.first().copied().unwrap_or(0);
                let mut bits = 0u8;
                for bit in 0..Self::BIT_COUNT {
                    if octet & (0x80 >> bit) != 0 {
                        bits |= 1 << bit;
                    }
                }
                Self::from_bits_truncate(bits)
            }

            pub fn encode_context(self, w: &mut Writer<'_>, tag_num: u8) -> Result<(), EncodeError> {
                let octet = [self.to_octet()];
                encode_ctx_bit_string(w, tag_num, BitString::new(8 - Self::BIT_COUNT, &octet))
            }
        }
    };
}

wire_bits!(StatusFlags, 4);
wire_bits!(ResultFlags, 3);
wire_bits!(LogStatus, 3);

#[cfg(test)]
mod tests {
    use super::{LogStatus, ResultFlags, StatusFlags};
    use crate::encoding::writer::Writer;
    use crate::types::BitString;

    #[test]
    fn status_flags_pack_msb_first() {
        let flags = StatusFlags::IN_ALARM | StatusFlags::OUT_OF_SERVICE;
        assert_eq!(flags.to_octet(), 0b1001_0000);

        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        flags.encode_context(&mut w, 2).unwrap();
        assert_eq!(w.as_written(), &[0x2A, 0x04, 0x90]);
    }

    #[test]
    fn result_flags_use_five_unused_bits() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        (ResultFlags::FIRST_ITEM | ResultFlags::LAST_ITEM)
            .encode_context(&mut w, 3)
            .unwrap();
        assert_eq!(w.as_written(), &[0x3A, 0x05, 0xC0]);
    }

    #[test]
    fn from_bit_string_tolerates_short_and_long_input() {
        assert_eq!(
            StatusFlags::from_bit_string(BitString::new(0, &[])),
            StatusFlags::empty()
        );
        assert_eq!(
            LogStatus::from_bit_string(BitString::new(0, &[0xFF, 0xFF])),
            LogStatus::all()
        );
    }
}
