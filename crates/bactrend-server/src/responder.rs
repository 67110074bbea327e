//! BACnet/IP side of the device.
//!
//! [`Responder`] answers confirmed ReadRange requests against the shared
//! trend logs and ReadProperty requests against trend logs and points. Any
//! other confirmed service is rejected; unconfirmed traffic and
//! network-layer messages are ignored.

use std::sync::Arc;

use bactrend_core::apdu::{
    AbortPdu, ApduType, ConfirmedRequestHeader, RejectPdu, ABORT_SEGMENTATION_NOT_SUPPORTED,
};
use bactrend_core::encoding::{reader::Reader, writer::Writer};
use bactrend_core::npdu::Npdu;
use bactrend_core::services::read_property::SERVICE_READ_PROPERTY;
use bactrend_core::services::read_range::SERVICE_READ_RANGE;
use bactrend_core::types::RejectReason;
use bactrend_datalink::{DataLink, DataLinkAddress};
use bactrend_trendlog::{handle_read_property, handle_read_range};

use crate::points::DeviceObjects;
use crate::state::DeviceState;
use crate::ServerError;

/// Largest APDU the device ever sends, matching a 1476-octet BACnet/IP link.
pub const MAX_APDU_LEN: usize = 1476;

pub struct Responder<D: DataLink> {
    datalink: D,
    state: Arc<DeviceState>,
}

impl<D: DataLink> Responder<D> {
    pub fn new(datalink: D, state: Arc<DeviceState>) -> Self {
        Self { datalink, state }
    }

    /// Answers requests until the data link fails to receive.
    pub async fn run(&self) -> Result<(), ServerError> {
        let mut buf = [0u8; 1500];
        loop {
            let (n, source) = match self.datalink.recv(&mut buf).await {
                Ok(frame) => frame,
                Err(err) if err.is_per_frame() => {
                    log::debug!("responder: dropped frame: {err}");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if let Err(err) = self.handle_frame(&buf[..n], source).await {
                log::debug!("responder: error handling frame from {source}: {err}");
            }
        }
    }

    pub async fn handle_frame(
        &self,
        frame: &[u8],
        source: DataLinkAddress,
    ) -> Result<(), ServerError> {
        let Some(reply) = self.reply_to(frame)? else {
            return Ok(());
        };
        self.datalink.send(source, &reply).await?;
        Ok(())
    }

    /// Builds the whole reply NPDU, or `None` when nothing is owed.
    fn reply_to(&self, frame: &[u8]) -> Result<Option<Vec<u8>>, ServerError> {
        let mut r = Reader::new(frame);
        let npdu = Npdu::decode(&mut r)?;
        if npdu.is_network_message() || r.is_empty() {
            return Ok(None);
        }
        if ApduType::from_u8(r.peek_u8()? >> 4) != Some(ApduType::ConfirmedRequest) {
            return Ok(None);
        }
        let header = ConfirmedRequestHeader::decode(&mut r)?;

        let mut out = vec![0u8; 16 + MAX_APDU_LEN];
        let npdu_len = {
            let mut w = Writer::new(&mut out);
            npdu.reply().encode(&mut w)?;
            w.position()
        };
        let apdu_limit = header.max_apdu_len().min(MAX_APDU_LEN);
        let apdu = &mut out[npdu_len..npdu_len + apdu_limit];

        let apdu_len = if header.is_segmented() {
            log::debug!("invoke {}: segmented request refused", header.invoke_id);
            let mut w = Writer::new(apdu);
            AbortPdu {
                server: true,
                invoke_id: header.invoke_id,
                reason: ABORT_SEGMENTATION_NOT_SUPPORTED,
            }
            .encode(&mut w)?;
            w.position()
        } else if header.service_choice == SERVICE_READ_RANGE {
            let logs = self.state.trendlogs();
            handle_read_range(&*logs, r.rest(), header.invoke_id, apdu)?
        } else if header.service_choice == SERVICE_READ_PROPERTY {
            let points = self.state.points();
            let trendlogs = self.state.trendlogs();
            let objects = DeviceObjects {
                points: &points,
                trendlogs: &trendlogs,
            };
            handle_read_property(&objects, r.rest(), header.invoke_id, apdu)?
        } else {
            log::debug!(
                "invoke {}: unrecognized service 0x{:02x}",
                header.invoke_id,
                header.service_choice
            );
            let mut w = Writer::new(apdu);
            RejectPdu::new(header.invoke_id, RejectReason::UnrecognizedService).encode(&mut w)?;
            w.position()
        };

        out.truncate(npdu_len + apdu_len);
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::Responder;
    use crate::config::DaemonConfig;
    use crate::state::DeviceState;
    use bactrend_core::apdu::{
        AbortPdu, BacnetError, ComplexAckHeader, ConfirmedRequestHeader, RejectPdu, Segment,
    };
    use bactrend_core::encoding::{reader::Reader, writer::Writer};
    use bactrend_core::npdu::{Npdu, NpduAddress};
    use crate::points::PointConfig;
    use bactrend_core::services::log_record::LogDatum;
    use bactrend_core::services::read_property::{
        PropertyValue, ReadPropertyAck, ReadPropertyRequest,
    };
    use bactrend_core::services::read_range::{ReadRangeAck, ReadRangeRequest};
    use bactrend_core::types::{
        ErrorCode, ObjectId, ObjectType, PropertyId, RejectReason, ResultFlags,
    };
    use bactrend_datalink::{DataLink, DataLinkAddress, DataLinkError};
    use bactrend_trendlog::{LinkedObject, Sample, TrendLogConfig};
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MockDataLink {
        sent: Arc<Mutex<Vec<(DataLinkAddress, Vec<u8>)>>>,
    }

    impl DataLink for MockDataLink {
        async fn send(&self, address: DataLinkAddress, payload: &[u8]) -> Result<(), DataLinkError> {
            self.sent
                .lock()
                .expect("poisoned lock")
                .push((address, payload.to_vec()));
            Ok(())
        }

        async fn recv(&self, _buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError> {
            Err(DataLinkError::InvalidFrame)
        }
    }

    fn source() -> DataLinkAddress {
        DataLinkAddress::Ip("127.0.0.1:47808".parse().unwrap())
    }

    fn device(records: usize) -> Arc<DeviceState> {
        let state = DeviceState::new(DaemonConfig::default());
        {
            let mut logs = state.trendlogs();
            let mut cfg = TrendLogConfig::new(1, "room");
            cfg.trigger_type = bactrend_trendlog::TriggerType::Triggered;
            cfg.linked_object = Some(LinkedObject {
                object_type: ObjectType::AnalogValue,
                instance: 1,
            });
            logs.add(cfg).unwrap();
            let base = NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap();
            for i in 0..records {
                let now = base + chrono::Duration::minutes(i as i64);
                logs.record_value(1, Sample::new(LogDatum::Real(i as f32)), now)
                    .unwrap();
            }
        }
        state
    }

    fn request_frame(npdu: Npdu, req: &ReadRangeRequest) -> Vec<u8> {
        let mut buf = [0u8; 128];
        let mut w = Writer::new(&mut buf);
        npdu.encode(&mut w).unwrap();
        req.encode(&mut w).unwrap();
        w.as_written().to_vec()
    }

    fn trend_log(instance: u32) -> ObjectId {
        ObjectId::new(ObjectType::TrendLog, instance)
    }

    fn only_reply(sent: &Arc<Mutex<Vec<(DataLinkAddress, Vec<u8>)>>>) -> Vec<u8> {
        let sent = sent.lock().expect("poisoned lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, source());
        sent[0].1.clone()
    }

    #[tokio::test]
    async fn read_range_gets_complex_ack() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(5));

        let req = ReadRangeRequest::by_position(trend_log(1), PropertyId::LogBuffer, 4, 2, 17);
        responder
            .handle_frame(&request_frame(Npdu::new(0x04), &req), source())
            .await
            .unwrap();

        let reply = only_reply(&sent);
        let mut r = Reader::new(&reply);
        assert_eq!(Npdu::decode(&mut r).unwrap(), Npdu::new(0));
        let header = ComplexAckHeader::decode(&mut r).unwrap();
        assert_eq!(header.invoke_id, 17);
        let ack = ReadRangeAck::decode_after_header(&mut r).unwrap();
        assert_eq!(ack.item_count, 2);
        assert_eq!(ack.items[0].datum, LogDatum::Real(3.0));
        assert_eq!(ack.items[1].datum, LogDatum::Real(4.0));
        assert_eq!(ack.first_sequence_number, Some(4));
        assert!(ack.result_flags.contains(ResultFlags::LAST_ITEM));
        assert!(!ack.result_flags.contains(ResultFlags::FIRST_ITEM));
    }

    #[tokio::test]
    async fn routed_request_is_answered_through_router() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(1));

        let origin = NpduAddress {
            network: 7,
            mac: [0x11, 0, 0, 0, 0, 0],
            mac_len: 1,
        };
        let mut npdu = Npdu::new(0x08);
        npdu.source = Some(origin);
        let req = ReadRangeRequest::read_all(trend_log(1), PropertyId::LogBuffer, 2);
        responder
            .handle_frame(&request_frame(npdu, &req), source())
            .await
            .unwrap();

        let reply = only_reply(&sent);
        let decoded = Npdu::decode(&mut Reader::new(&reply)).unwrap();
        assert_eq!(decoded.destination, Some(origin));
        assert_eq!(decoded.hop_count, Some(255));
    }

    #[tokio::test]
    async fn unknown_trend_log_gets_error() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(1));

        let req = ReadRangeRequest::read_all(trend_log(8), PropertyId::LogBuffer, 3);
        responder
            .handle_frame(&request_frame(Npdu::new(0x04), &req), source())
            .await
            .unwrap();

        let reply = only_reply(&sent);
        let mut r = Reader::new(&reply);
        Npdu::decode(&mut r).unwrap();
        let err = BacnetError::decode(&mut r).unwrap();
        assert_eq!(err.invoke_id, 3);
        assert_eq!(err.code(), Some(ErrorCode::UnknownObject));
    }

    #[tokio::test]
    async fn other_services_are_rejected() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(0));

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        Npdu::new(0x04).encode(&mut w).unwrap();
        ConfirmedRequestHeader::new(6, 0x0F).encode(&mut w).unwrap();
        w.write_all(&[0x0C, 0x00, 0x80, 0x00, 0x01]).unwrap();
        responder
            .handle_frame(w.as_written(), source())
            .await
            .unwrap();

        let reply = only_reply(&sent);
        let mut r = Reader::new(&reply);
        Npdu::decode(&mut r).unwrap();
        let reject = RejectPdu::decode(&mut r).unwrap();
        assert_eq!(reject.invoke_id, 6);
        assert_eq!(reject.reason, RejectReason::UnrecognizedService.to_u8());
    }

    #[tokio::test]
    async fn segmented_requests_are_aborted() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(0));

        let mut header = ConfirmedRequestHeader::new(9, 0x1A);
        header.segment = Some(Segment {
            sequence_number: 0,
            window_size: 1,
            more_follows: true,
        });
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        Npdu::new(0x04).encode(&mut w).unwrap();
        header.encode(&mut w).unwrap();
        responder
            .handle_frame(w.as_written(), source())
            .await
            .unwrap();

        let reply = only_reply(&sent);
        let mut r = Reader::new(&reply);
        Npdu::decode(&mut r).unwrap();
        let abort = AbortPdu::decode(&mut r).unwrap();
        assert!(abort.server);
        assert_eq!(abort.invoke_id, 9);
    }

    #[tokio::test]
    async fn reply_respects_requester_max_apdu() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(40));

        let req = ReadRangeRequest::read_all(trend_log(1), PropertyId::LogBuffer, 1);
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        Npdu::new(0x04).encode(&mut w).unwrap();
        let mut header = ConfirmedRequestHeader::new(1, 0x1A);
        header.max_apdu = 1;
        header.encode(&mut w).unwrap();
        req.encode_service(&mut w).unwrap();
        responder
            .handle_frame(w.as_written(), source())
            .await
            .unwrap();

        let reply = only_reply(&sent);
        assert!(reply.len() <= 2 + 128);
        let mut r = Reader::new(&reply);
        Npdu::decode(&mut r).unwrap();
        ComplexAckHeader::decode(&mut r).unwrap();
        let ack = ReadRangeAck::decode_after_header(&mut r).unwrap();
        assert!(ack.item_count < 40);
        assert!(ack.result_flags.contains(ResultFlags::MORE_ITEMS));
        assert_eq!(ack.first_sequence_number, Some(1));
    }

    #[tokio::test]
    async fn unconfirmed_and_network_messages_are_ignored() {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, device(0));

        responder
            .handle_frame(&[0x01, 0x00, 0x10, 0x08], source())
            .await
            .unwrap();
        responder
            .handle_frame(&[0x01, 0x80, 0x00], source())
            .await
            .unwrap();
        assert!(sent.lock().expect("poisoned lock").is_empty());
    }

    async fn read_property(state: Arc<DeviceState>, req: &ReadPropertyRequest) -> Vec<u8> {
        let dl = MockDataLink::default();
        let sent = dl.sent.clone();
        let responder = Responder::new(dl, state);
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        Npdu::new(0x04).encode(&mut w).unwrap();
        req.encode(&mut w).unwrap();
        responder
            .handle_frame(w.as_written(), source())
            .await
            .unwrap();
        only_reply(&sent)
    }

    fn property_ack(reply: &[u8]) -> PropertyValue<'_> {
        let mut r = Reader::new(reply);
        Npdu::decode(&mut r).unwrap();
        let header = ComplexAckHeader::decode(&mut r).unwrap();
        assert_eq!(header.service_choice, 0x0C);
        ReadPropertyAck::decode_after_header(&mut r).unwrap().value
    }

    #[tokio::test]
    async fn read_property_reports_record_count() {
        let req = ReadPropertyRequest::new(trend_log(1), PropertyId::RecordCount, 21);
        let reply = read_property(device(3), &req).await;
        assert_eq!(property_ack(&reply), PropertyValue::Unsigned(3));
    }

    #[tokio::test]
    async fn read_property_reports_point_present_value() {
        let state = device(0);
        state
            .points()
            .insert(&PointConfig {
                object_type: ObjectType::AnalogValue,
                instance: 1,
                name: "Setpoint".to_string(),
                present_value: Some(22.5),
            })
            .unwrap();
        let req = ReadPropertyRequest::new(
            ObjectId::new(ObjectType::AnalogValue, 1),
            PropertyId::PresentValue,
            22,
        );
        let reply = read_property(state, &req).await;
        assert_eq!(property_ack(&reply), PropertyValue::Real(22.5));
    }

    #[tokio::test]
    async fn read_property_unknown_property_gets_error() {
        let req = ReadPropertyRequest::new(trend_log(1), PropertyId::PresentValue, 23);
        let reply = read_property(device(1), &req).await;
        let mut r = Reader::new(&reply);
        Npdu::decode(&mut r).unwrap();
        let err = BacnetError::decode(&mut r).unwrap();
        assert_eq!(err.invoke_id, 23);
        assert_eq!(err.code(), Some(ErrorCode::UnknownProperty));
    }
}
