//! Value types shared by the codecs.

pub mod date_time;
pub mod enums;
pub mod flags;
pub mod object_id;
pub mod object_type;
pub mod property_id;

pub use date_time::{Date, DateTime, Time};
pub use enums::{ErrorClass, ErrorCode, RejectReason};
pub use flags::{BitString, LogStatus, ResultFlags, StatusFlags};
pub use object_id::ObjectId;
pub use object_type::ObjectType;
pub use property_id::PropertyId;
