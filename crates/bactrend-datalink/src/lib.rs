//! Data links for bactrend. Only BACnet/IP is provided; the responder and
//! the command-line client are generic over [`DataLink`] so tests can swap
//! in a mock.

#![allow(async_fn_in_trait)]

pub mod bip;
pub mod link;

pub use bip::transport::BacnetIpTransport;
pub use link::{DataLink, DataLinkAddress, DataLinkError};
