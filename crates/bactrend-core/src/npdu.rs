use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const NPDU_VERSION: u8 = 0x01;

const NETWORK_MESSAGE: u8 = 0x80;
const HAS_DESTINATION: u8 = 0x20;
const HAS_SOURCE: u8 = 0x08;
const FIRST_VENDOR_MESSAGE: u8 = 0x80;
const MAX_MAC_LEN: usize = 6;
const DEFAULT_HOP_COUNT: u8 = 255;

/// DNET/DADR or SNET/SADR. Only the first `mac_len` octets of `mac` are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpduAddress {
    pub network: u16,
    pub mac: [u8; 6],
    pub mac_len: u8,
}

impl NpduAddress {
    fn mac_octets(&self) -> Result<&[u8], EncodeError> {
        self.mac
            .get(..usize::from(self.mac_len))
            .ok_or(EncodeError::InvalidLength)
    }

    fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mac = self.mac_octets()?;
        w.write_be_u16(self.network)?;
        w.write_u8(self.mac_len)?;
        w.write_all(mac)
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let network = r.read_be_u16()?;
        let len = usize::from(r.read_u8()?);
        if len > MAX_MAC_LEN {
            return Err(DecodeError::InvalidLength);
        }
        let mut mac = [0u8; MAX_MAC_LEN];
        mac[..len].copy_from_slice(r.read_exact(len)?);
        Ok(Self {
            network,
            mac,
            mac_len: len as u8,
        })
    }
}

/// Network layer header in front of every APDU.
///
/// `control` is kept as received; the optional fields are present exactly
/// when the matching control bits say so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Npdu {
    pub control: u8,
    pub destination: Option<NpduAddress>,
    pub source: Option<NpduAddress>,
    pub hop_count: Option<u8>,
    pub message_type: Option<u8>,
    pub vendor_id: Option<u16>,
}

impl Npdu {
    pub const fn new(control: u8) -> Self {
        Self {
            control,
            destination: None,
            source: None,
            hop_count: None,
            message_type: None,
            vendor_id: None,
        }
    }

    pub const fn is_network_message(&self) -> bool {
        self.control & NETWORK_MESSAGE != 0
    }

    /// Header for the answer to this NPDU. A request relayed by a router
    /// names its origin in SNET/SADR, so the answer goes back there.
    pub fn reply(&self) -> Self {
        let Some(origin) = self.source else {
            return Self::new(0);
        };
        Self {
            destination: Some(origin),
            hop_count: Some(DEFAULT_HOP_COUNT),
            ..Self::new(HAS_DESTINATION)
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_all(&[NPDU_VERSION, self.control])?;
        if let Some(dest) = &self.destination {
            dest.encode(w)?;
        }
        if let Some(src) = &self.source {
            src.encode(w)?;
        }
        if self.destination.is_some() {
            w.write_u8(self.hop_count.unwrap_or(DEFAULT_HOP_COUNT))?;
        }
        if self.is_network_message() {
            let kind = self.message_type.unwrap_or(0);
            w.write_u8(kind)?;
            if kind >= FIRST_VENDOR_MESSAGE {
                w.write_be_u16(self.vendor_id.unwrap_or(0))?;
            }
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.read_u8()? != NPDU_VERSION {
            return Err(DecodeError::InvalidValue);
        }
        let mut npdu = Self::new(r.read_u8()?);
        let control = npdu.control;

        if control & HAS_DESTINATION != 0 {
            npdu.destination = Some(NpduAddress::decode(r)?);
        }
        if control & HAS_SOURCE != 0 {
            npdu.source = Some(NpduAddress::decode(r)?);
        }
        if npdu.destination.is_some() {
            npdu.hop_count = Some(r.read_u8()?);
        }
        if npdu.is_network_message() {
            let kind = r.read_u8()?;
            npdu.message_type = Some(kind);
            if kind >= FIRST_VENDOR_MESSAGE {
                npdu.vendor_id = Some(r.read_be_u16()?);
            }
        }
        Ok(npdu)
    }
}
