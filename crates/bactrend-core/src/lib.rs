//! BACnet wire encoding for trend-log servers.
//!
//! The pieces a trend-log device needs and nothing more: the tag codec over
//! caller-owned buffers, the NPDU, confirmed-service APDU headers with their
//! Error, Reject and Abort replies, and ReadRange with BACnetLogRecord items.
//!
//! Features: `std` adds `std::error::Error` impls, `alloc` enables the
//! ReadRange-ACK decoder that collects items, and `serde` makes object
//! types and timestamps (de)serializable.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod macros;

pub mod apdu;
pub mod encoding;
pub mod error;
pub mod npdu;
pub mod services;
pub mod types;

pub use error::{DecodeError, EncodeError};
