use bactrend_core::types::ObjectType;
use bactrend_datalink::DataLinkError;
use bactrend_trendlog::{ReadRangeError, TrendLogError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("datalink error: {0}")]
    DataLink(#[from] DataLinkError),
    #[error("encode error: {0}")]
    Encode(#[from] bactrend_core::EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] bactrend_core::DecodeError),
    #[error("read range: {0}")]
    ReadRange(#[from] ReadRangeError),
    #[error("trend log error: {0}")]
    TrendLog(#[from] TrendLogError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown point {object_type:?} {instance}")]
    UnknownPoint {
        object_type: ObjectType,
        instance: u32,
    },
    #[error("{0:?} is not a point type")]
    NotAPoint(ObjectType),
}
