//! Virtual BACnet device serving trend logs.
//!
//! A [`DeviceState`] holds the device's points and trend logs. Three tasks
//! share it: the [`Responder`] answers ReadRange and ReadProperty over
//! BACnet/IP, the [`CommandServer`] takes JSON commands over TCP, and the
//! [`Sampler`] feeds periodic logs.

pub mod command;
pub mod config;
pub mod error;
pub mod points;
pub mod responder;
pub mod sampler;
pub mod state;

pub use command::{Command, CommandServer};
pub use config::DaemonConfig;
pub use error::ServerError;
pub use points::{Point, PointConfig, PointTable};
pub use responder::Responder;
pub use sampler::Sampler;
pub use state::DeviceState;
