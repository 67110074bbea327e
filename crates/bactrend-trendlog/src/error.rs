use bactrend_core::types::{ErrorClass, ErrorCode};
use bactrend_core::EncodeError;
use thiserror::Error;

/// A confirmed request refused with a BACnet error class and code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request refused: {class:?}/{code:?}")]
pub struct RangeError {
    pub class: ErrorClass,
    pub code: ErrorCode,
}

impl RangeError {
    pub const fn new(class: ErrorClass, code: ErrorCode) -> Self {
        Self { class, code }
    }

    pub const fn unknown_object() -> Self {
        Self::new(ErrorClass::Object, ErrorCode::UnknownObject)
    }

    pub const fn invalid_array_index() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::InvalidArrayIndex)
    }

    pub const fn invalid_parameter_data_type() -> Self {
        Self::new(ErrorClass::Services, ErrorCode::InvalidParameterDataType)
    }

    pub const fn property_is_not_a_list() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::PropertyIsNotAList)
    }

    pub const fn property_is_not_an_array() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::PropertyIsNotAnArray)
    }

    pub const fn unknown_property() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::UnknownProperty)
    }

    /// Log-buffer is read with ReadRange only.
    pub const fn read_access_denied() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::ReadAccessDenied)
    }
}

#[derive(Debug, Error)]
pub enum ReadRangeError {
    #[error(transparent)]
    Refused(#[from] RangeError),
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Error)]
pub enum TrendLogError {
    #[error("maximum number of trend logs reached ({max})")]
    TooManyLogs { max: usize },
    #[error("buffer size {size} out of range (1..={max})")]
    BufferSize { size: u32, max: u32 },
    #[error("trend log {0} already exists")]
    DuplicateInstance(u32),
    #[error("unknown trend log {0}")]
    UnknownInstance(u32),
    #[error("configuration has no 'trendlogs' array")]
    MissingTrendLogs,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
