use bactrend_core::encoding::{reader::Reader, writer::Writer};
use bactrend_core::npdu::Npdu;
use bactrend_core::services::read_range::{ReadRangeRequest, ReadRangeSpecifier};
use bactrend_core::types::{Date, ObjectId, PropertyId, Time};
use bactrend_datalink::{BacnetIpTransport, DataLink, DataLinkAddress};
use bactrend_tools::{read_range_reply_json, reply_invoke_id, ObjectTypeArg};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone, ValueEnum)]
enum RangeModeArg {
    All,
    Position,
    Sequence,
    Time,
}

#[derive(Parser, Debug)]
#[command(name = "bactrend-readrange")]
struct Args {
    #[arg(long)]
    ip: IpAddr,
    #[arg(long, default_value_t = 47808)]
    port: u16,
    #[arg(long, value_enum, default_value = "trend-log")]
    object_type: ObjectTypeArg,
    #[arg(long)]
    instance: u32,
    #[arg(long, default_value_t = 131)]
    property_id: u32,
    #[arg(long)]
    property_array_index: Option<u32>,
    #[arg(long, value_enum, default_value = "position")]
    mode: RangeModeArg,
    #[arg(long, default_value_t = 1)]
    start_index: u32,
    #[arg(long, default_value_t = 1)]
    start_sequence: u32,
    #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
    count: i32,
    #[arg(long, default_value_t = 2025)]
    year: u16,
    #[arg(long, default_value_t = 1)]
    month: u8,
    #[arg(long, default_value_t = 1)]
    day: u8,
    #[arg(long, default_value_t = 0)]
    hour: u8,
    #[arg(long, default_value_t = 0)]
    minute: u8,
    #[arg(long, default_value_t = 0)]
    second: u8,
    #[arg(long, default_value_t = 1)]
    invoke_id: u8,
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let range = match args.mode {
        RangeModeArg::All => ReadRangeSpecifier::ReadAll,
        RangeModeArg::Position => ReadRangeSpecifier::ByPosition {
            reference_index: args.start_index,
            count: args.count,
        },
        RangeModeArg::Sequence => ReadRangeSpecifier::BySequenceNumber {
            reference_sequence: args.start_sequence,
            count: args.count,
        },
        RangeModeArg::Time => ReadRangeSpecifier::ByTime {
            date: Date::from_ymd(args.year, args.month, args.day).ok_or("invalid date")?,
            time: Time::hms(args.hour, args.minute, args.second),
            count: args.count,
        },
    };
    let request = ReadRangeRequest {
        object_id: ObjectId::new(args.object_type.into_object_type(), args.instance),
        property_id: PropertyId::from_u32(args.property_id),
        array_index: args.property_array_index,
        range,
        invoke_id: args.invoke_id,
    };

    let mut frame = [0u8; 128];
    let mut w = Writer::new(&mut frame);
    Npdu::new(0x04).encode(&mut w)?;
    request.encode(&mut w)?;

    let transport = BacnetIpTransport::bind("0.0.0.0:0".parse::<SocketAddr>()?).await?;
    let device = DataLinkAddress::Ip(SocketAddr::new(args.ip, args.port));
    transport.send(device, w.as_written()).await?;
    log::debug!("sent ReadRange {:?} to {device}", request.range);

    let reply = tokio::time::timeout(Duration::from_millis(args.timeout_ms), async {
        let mut buf = [0u8; 1500];
        loop {
            let (n, source) = match transport.recv(&mut buf).await {
                Ok(frame) => frame,
                Err(err) if err.is_per_frame() => {
                    log::debug!("ignoring frame: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let mut r = Reader::new(&buf[..n]);
            let Ok(npdu) = Npdu::decode(&mut r) else {
                continue;
            };
            if source != device || npdu.is_network_message() {
                continue;
            }
            if reply_invoke_id(r.rest()) == Some(args.invoke_id) {
                return Ok(r.rest().to_vec());
            }
        }
    })
    .await
    .map_err(|_| "no reply from device")??;

    let json = read_range_reply_json(&reply)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
