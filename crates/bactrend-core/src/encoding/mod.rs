//! The BACnet tag-length-value codec.
//!
//! [`reader::Reader`] and [`writer::Writer`] work over caller-owned buffers
//! and never allocate; [`tag`] handles tag headers and [`primitives`] the
//! values behind them.

pub mod primitives;
pub mod reader;
pub mod tag;
pub mod writer;
