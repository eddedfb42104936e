//! Kodilink - Voice and flow control bridge for Kodi media centers
//!
//! Connects to each configured device, keeps the connections alive, and
//! turns playback and system events into outward triggers.

use anyhow::Result;
use clap::Parser;
use kodilink::config::Config;
use kodilink::registry::DeviceRegistry;
use kodilink::supervisor::{Supervisor, TcpConnector};
use kodilink::triggers::TriggerBus;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file (defaults to the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("📺 Kodilink v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let registry = Arc::new(DeviceRegistry::new());
    let bus = TriggerBus::new();
    let connector = Arc::new(TcpConnector::new(Duration::from_millis(
        config.call_timeout_ms,
    )));

    for device in &config.devices {
        info!("🔌 Supervising {} ({})", device.name, device.host);
        let _ = Supervisor::new(
            registry.clone(),
            bus.clone(),
            connector.clone(),
            device.clone(),
            Duration::from_millis(config.reconnect_interval_ms),
        )
        .spawn();
    }

    // Log every outward trigger; the hub glue subscribes the same way
    let mut triggers = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = triggers.recv().await {
            info!("➡️ {} {:?}", event.name(), event.tokens());
        }
    });

    info!("✅ Kodilink ready ({} device(s) configured)", config.devices.len());
    tokio::signal::ctrl_c().await?;
    info!("👋 Shutting down");
    Ok(())
}
