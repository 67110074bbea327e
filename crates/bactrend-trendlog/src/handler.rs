use bactrend_core::apdu::{
    AbortPdu, BacnetError, ComplexAckHeader, RejectPdu, ABORT_SEGMENTATION_NOT_SUPPORTED,
};
use bactrend_core::encoding::{reader::Reader, writer::Writer};
use bactrend_core::services::read_property::{
    ReadPropertyAck, ReadPropertyRequest, SERVICE_READ_PROPERTY,
};
use bactrend_core::services::read_range::{ReadRangeRequest, SERVICE_READ_RANGE};
use bactrend_core::types::RejectReason;
use bactrend_core::{DecodeError, EncodeError};

use crate::error::{RangeError, ReadRangeError};
use crate::property::PropertySource;
use crate::range::encode_read_range;
use crate::repository::LogRepository;

fn reject_reason(err: DecodeError) -> RejectReason {
    match err {
        DecodeError::UnexpectedEof => RejectReason::MissingRequiredParameter,
        DecodeError::InvalidTag => RejectReason::InvalidTag,
        DecodeError::InvalidLength | DecodeError::InvalidValue => {
            RejectReason::InvalidParameterDataType
        }
        _ => RejectReason::Other,
    }
}

/// The decoded request, or the reason to reject it. Parameters left over
/// after a complete request are a reject too.
fn accept<T>(decoded: Result<T, DecodeError>, rest: &Reader<'_>) -> Result<T, RejectReason> {
    match decoded {
        Ok(request) if rest.is_empty() => Ok(request),
        Ok(_) => Err(RejectReason::TooManyArguments),
        Err(err) => Err(reject_reason(err)),
    }
}

/// Answers a ReadRange request whose confirmed-request header has already
/// been consumed. `service` holds the service parameters only.
///
/// Writes a Complex-ACK, Error, Reject or Abort APDU into `out` and returns
/// its length. Fails only when `out` cannot hold even a three-octet reply.
pub fn handle_read_range<R: LogRepository + ?Sized>(
    repo: &R,
    service: &[u8],
    invoke_id: u8,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let mut r = Reader::new(service);
    let decoded = ReadRangeRequest::decode_after_header(&mut r, invoke_id);
    let request = match accept(decoded, &r) {
        Ok(request) => request,
        Err(reason) => {
            log::debug!("ReadRange {invoke_id}: rejected, {reason:?}");
            return write_reject(out, invoke_id, reason);
        }
    };

    let ack = ComplexAckHeader::new(invoke_id, SERVICE_READ_RANGE);
    let header_len = {
        let mut w = Writer::new(out);
        ack.encode(&mut w)?;
        w.position()
    };

    match encode_read_range(repo, &request, &mut out[header_len..]) {
        Ok(outcome) => Ok(header_len + outcome.len),
        Err(ReadRangeError::Refused(refusal)) => {
            log::debug!("ReadRange {invoke_id}: {refusal}");
            write_error(out, invoke_id, SERVICE_READ_RANGE, refusal)
        }
        Err(ReadRangeError::Encode(err)) => {
            log::warn!("ReadRange {invoke_id}: reply does not fit: {err}");
            write_abort(out, invoke_id)
        }
    }
}

/// Answers a ReadProperty request, with the same reply rules as
/// [`handle_read_range`]. None of the served properties is an array, so any
/// array index is refused once the object and property are known.
pub fn handle_read_property<S: PropertySource + ?Sized>(
    source: &S,
    service: &[u8],
    invoke_id: u8,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let mut r = Reader::new(service);
    let decoded = ReadPropertyRequest::decode_after_header(&mut r, invoke_id);
    let request = match accept(decoded, &r) {
        Ok(request) => request,
        Err(reason) => {
            log::debug!("ReadProperty {invoke_id}: rejected, {reason:?}");
            return write_reject(out, invoke_id, reason);
        }
    };

    let value = source
        .read_property(request.object_id, request.property_id)
        .and_then(|value| match request.array_index {
            Some(_) => Err(RangeError::property_is_not_an_array()),
            None => Ok(value),
        });
    let value = match value {
        Ok(value) => value,
        Err(refusal) => {
            log::debug!(
                "ReadProperty {invoke_id}: {} {:?}: {refusal}",
                request.object_id,
                request.property_id
            );
            return write_error(out, invoke_id, SERVICE_READ_PROPERTY, refusal);
        }
    };

    let encoded = {
        let mut w = Writer::new(out);
        ComplexAckHeader::new(invoke_id, SERVICE_READ_PROPERTY)
            .encode(&mut w)
            .and_then(|()| {
                ReadPropertyAck {
                    object_id: request.object_id,
                    property_id: request.property_id,
                    array_index: None,
                    value,
                }
                .encode(&mut w)
            })
            .map(|()| w.position())
    };
    encoded.or_else(|err| {
        log::warn!("ReadProperty {invoke_id}: reply does not fit: {err}");
        write_abort(out, invoke_id)
    })
}

fn write_reject(out: &mut [u8], invoke_id: u8, reason: RejectReason) -> Result<usize, EncodeError> {
    let mut w = Writer::new(out);
    RejectPdu::new(invoke_id, reason).encode(&mut w)?;
    Ok(w.position())
}

fn write_error(
    out: &mut [u8],
    invoke_id: u8,
    service_choice: u8,
    refusal: RangeError,
) -> Result<usize, EncodeError> {
    let mut w = Writer::new(out);
    BacnetError::new(invoke_id, service_choice, refusal.class, refusal.code).encode(&mut w)?;
    Ok(w.position())
}

fn write_abort(out: &mut [u8], invoke_id: u8) -> Result<usize, EncodeError> {
    let mut w = Writer::new(out);
    AbortPdu {
        server: true,
        invoke_id,
        reason: ABORT_SEGMENTATION_NOT_SUPPORTED,
    }
    .encode(&mut w)?;
    Ok(w.position())
}
