use bactrend_core::encoding::{reader::Reader, writer::Writer};
use bactrend_core::{DecodeError, EncodeError};
use std::net::{Ipv4Addr, SocketAddrV4};

pub const BVLL_TYPE_BACNET_IP: u8 = 0x81;
pub const HEADER_LEN: usize = 4;

pub const FORWARDED_NPDU: u8 = 0x04;
pub const DISTRIBUTE_BROADCAST_TO_NETWORK: u8 = 0x09;
pub const ORIGINAL_UNICAST_NPDU: u8 = 0x0A;
pub const ORIGINAL_BROADCAST_NPDU: u8 = 0x0B;

/// A received BVLL message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bvll<'a> {
    /// An NPDU sent by the UDP peer itself.
    Npdu(&'a [u8]),
    /// An NPDU a BBMD relayed for `origin`.
    Forwarded { origin: SocketAddrV4, npdu: &'a [u8] },
    /// BBMD management traffic and results; nothing to hand up.
    Other { function: u8 },
}

impl<'a> Bvll<'a> {
    /// Parses one datagram. Octets past the BVLL length are ignored.
    pub fn decode(datagram: &'a [u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(datagram);
        if r.read_u8()? != BVLL_TYPE_BACNET_IP {
            return Err(DecodeError::InvalidValue);
        }
        let function = r.read_u8()?;
        let body_len = usize::from(r.read_be_u16()?)
            .checked_sub(HEADER_LEN)
            .ok_or(DecodeError::InvalidLength)?;
        let body = r.read_exact(body_len)?;

        Ok(match function {
            ORIGINAL_UNICAST_NPDU | ORIGINAL_BROADCAST_NPDU | DISTRIBUTE_BROADCAST_TO_NETWORK => {
                Self::Npdu(body)
            }
            FORWARDED_NPDU => {
                let mut body = Reader::new(body);
                let ip = body.read_exact(4)?;
                let port = body.read_be_u16()?;
                Self::Forwarded {
                    origin: SocketAddrV4::new(Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]), port),
                    npdu: body.rest(),
                }
            }
            function => Self::Other { function },
        })
    }

    /// Writes `npdu` as an Original-Unicast-NPDU or Original-Broadcast-NPDU.
    pub fn encode_original(
        w: &mut Writer<'_>,
        npdu: &[u8],
        broadcast: bool,
    ) -> Result<(), EncodeError> {
        let length =
            u16::try_from(HEADER_LEN + npdu.len()).map_err(|_| EncodeError::InvalidLength)?;
        let function = if broadcast {
            ORIGINAL_BROADCAST_NPDU
        } else {
            ORIGINAL_UNICAST_NPDU
        };
        w.write_all(&[BVLL_TYPE_BACNET_IP, function])?;
        w.write_be_u16(length)?;
        w.write_all(npdu)
    }
}
