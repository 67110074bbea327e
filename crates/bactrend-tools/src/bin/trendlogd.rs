use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use bactrend_datalink::BacnetIpTransport;
use bactrend_server::sampler::DEFAULT_TICK;
use bactrend_server::{CommandServer, DaemonConfig, DeviceState, Responder, Sampler};
use clap::Parser;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "trendlogd")]
struct Args {
    /// JSON device configuration (points and trend logs).
    #[arg(long)]
    config: Option<PathBuf>,
    /// BACnet/IP bind address.
    #[arg(long, default_value = "0.0.0.0:47808")]
    bind: SocketAddr,
    /// Localhost TCP port of the JSON command socket.
    #[arg(long, default_value_t = 47900)]
    command_port: u16,
    /// Overrides the configured device instance.
    #[arg(long)]
    device_instance: Option<u32>,
    /// Overrides the configured sampler tick.
    #[arg(long)]
    sample_tick_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(instance) = args.device_instance {
        config.device_instance = instance;
    }
    if args.sample_tick_ms.is_some() {
        config.sample_tick_ms = args.sample_tick_ms;
    }

    let state = DeviceState::new(config);
    let transport = BacnetIpTransport::bind(args.bind).await?;
    let responder = Responder::new(transport, state.clone());
    let commands = CommandServer::bind(
        SocketAddr::from((Ipv4Addr::LOCALHOST, args.command_port)),
        state.clone(),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sampler = tokio::spawn(Sampler::new(state.clone(), DEFAULT_TICK).run(shutdown_rx));

    let device = state.config();
    println!(
        "trendlogd: device {} ({}) on {}, {} trend logs. Ctrl+C to stop.",
        device.device_instance,
        device.device_name,
        args.bind,
        state.trendlogs().len()
    );

    tokio::select! {
        result = responder.run() => result?,
        result = commands.run() => result?,
        _ = tokio::signal::ctrl_c() => log::info!("shutting down"),
    }

    let _ = shutdown_tx.send(true);
    sampler.await?;
    Ok(())
}
