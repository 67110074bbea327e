//! Trend logs for a BACnet device.
//!
//! A trend log is a bounded circular buffer of timestamped samples. This crate
//! holds the buffer ([`TrendLogBuffer`]), the manager that decides when logs
//! sample ([`TrendLogManager`]), and the ReadRange side: range resolution and
//! ACK encoding ([`encode_read_range`]) plus a service handler that turns a
//! request into a reply APDU ([`handle_read_range`]). Scalar trend-log
//! properties are served through [`PropertySource`] and
//! [`handle_read_property`].
//!
//! The encoder reads logs through the [`LogRepository`] and [`LogView`]
//! traits. Callers that share a repository across threads hold one lock for
//! the whole encode call so record indexes stay stable.

pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod handler;
pub mod manager;
pub mod property;
pub mod range;
pub mod repository;

pub use buffer::TrendLogBuffer;
pub use config::{LinkedObject, TrendLogConfig, TriggerType};
pub use error::{RangeError, ReadRangeError, TrendLogError};
pub use handler::{handle_read_property, handle_read_range};
pub use manager::{Sample, TrendLog, TrendLogManager, TrendLogStatus};
pub use property::PropertySource;
pub use range::{encode_read_range, resolve, ReadRangeOutcome, Slice};
pub use repository::{LogRepository, LogView};
