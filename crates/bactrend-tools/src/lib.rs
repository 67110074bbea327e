use bactrend_core::apdu::{AbortPdu, ApduType, BacnetError, ComplexAckHeader, RejectPdu};
use bactrend_core::encoding::reader::Reader;
use bactrend_core::services::read_range::ReadRangeAck;
use bactrend_core::types::ObjectType;
use bactrend_core::DecodeError;
use bactrend_server::command::record_json;
use clap::ValueEnum;
use serde_json::{json, Value};

/// CLI-friendly enum for selecting BACnet object types.
///
/// Maps human-readable names to [`ObjectType`] variants for use with clap argument parsing.
#[derive(Debug, Clone, ValueEnum)]
pub enum ObjectTypeArg {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryOutput,
    BinaryValue,
    Device,
    TrendLog,
    MultiStateInput,
    MultiStateOutput,
    MultiStateValue,
}

impl ObjectTypeArg {
    /// Convert to the core [`ObjectType`] representation.
    pub const fn into_object_type(self) -> ObjectType {
        match self {
            Self::AnalogInput => ObjectType::AnalogInput,
            Self::AnalogOutput => ObjectType::AnalogOutput,
            Self::AnalogValue => ObjectType::AnalogValue,
            Self::BinaryInput => ObjectType::BinaryInput,
            Self::BinaryOutput => ObjectType::BinaryOutput,
            Self::BinaryValue => ObjectType::BinaryValue,
            Self::Device => ObjectType::Device,
            Self::TrendLog => ObjectType::TrendLog,
            Self::MultiStateInput => ObjectType::MultiStateInput,
            Self::MultiStateOutput => ObjectType::MultiStateOutput,
            Self::MultiStateValue => ObjectType::MultiStateValue,
        }
    }
}

/// Invoke id of a reply APDU, for matching it to the request.
pub fn reply_invoke_id(apdu: &[u8]) -> Option<u8> {
    let kind = ApduType::from_u8(*apdu.first()? >> 4)?;
    match kind {
        ApduType::ComplexAck | ApduType::Error | ApduType::Reject | ApduType::Abort => {
            apdu.get(1).copied()
        }
        _ => None,
    }
}

/// Renders a ReadRange reply APDU as JSON. Error, Reject and Abort replies
/// become `{"error": ...}`, `{"reject": ...}` and `{"abort": ...}`.
pub fn read_range_reply_json(apdu: &[u8]) -> Result<Value, DecodeError> {
    let mut r = Reader::new(apdu);
    let kind = ApduType::from_u8(r.peek_u8()? >> 4).ok_or(DecodeError::InvalidValue)?;
    match kind {
        ApduType::ComplexAck => {
            ComplexAckHeader::decode(&mut r)?;
            let ack = ReadRangeAck::decode_after_header(&mut r)?;
            let flags = ack.result_flags;
            Ok(json!({
                "object_type": format!("{:?}", ack.object_id.object_type()),
                "instance": ack.object_id.instance(),
                "item_count": ack.item_count,
                "first_sequence": ack.first_sequence_number,
                "first_item": flags.contains(bactrend_core::types::ResultFlags::FIRST_ITEM),
                "last_item": flags.contains(bactrend_core::types::ResultFlags::LAST_ITEM),
                "more_items": flags.contains(bactrend_core::types::ResultFlags::MORE_ITEMS),
                "items": ack.items.iter().map(record_json).collect::<Vec<_>>(),
            }))
        }
        ApduType::Error => {
            let err = BacnetError::decode(&mut r)?;
            Ok(json!({
                "error": {
                    "class": err.class().map(|c| format!("{c:?}")),
                    "code": err.code().map(|c| format!("{c:?}")),
                }
            }))
        }
        ApduType::Reject => {
            let reject = RejectPdu::decode(&mut r)?;
            Ok(json!({ "reject": reject.reason }))
        }
        ApduType::Abort => {
            let abort = AbortPdu::decode(&mut r)?;
            Ok(json!({ "abort": abort.reason, "server": abort.server }))
        }
        _ => Err(DecodeError::InvalidValue),
    }
}
