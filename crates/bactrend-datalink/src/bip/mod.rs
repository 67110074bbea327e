//! BACnet/IP (Annex J): BVLL framing over UDP.

pub mod bvll;
pub mod transport;
