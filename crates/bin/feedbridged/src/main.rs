//! # feedbridged — feeder bridge daemon
//!
//! Binary entry point: loads the configuration, initialises logging, picks
//! the device and store backends and hands them to [`bridge::run`].
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use feedbridge_adapter_mqtt::MqttStore;
use feedbridge_adapter_storage_file::FileSnapshotStore;
use feedbridge_adapter_virtual::{VirtualDevice, VirtualStore};
use feedbridge_app::ports::{LineSink, LineSource, SystemClock};
use feedbridged::bridge;
use feedbridged::config::{Config, DeviceBackend, StoreBackend};

/// Distances (cm) cycled by the virtual device.
const VIRTUAL_DISTANCES: [f64; 4] = [3.0, 4.5, 6.0, 7.5];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "feedbridged starting");

    match config.device.backend {
        DeviceBackend::Serial => {
            let (source, sink) = feedbridge_adapter_serial::open(&config.device.serial)
                .await
                .with_context(|| format!("failed to open {}", config.device.serial.port))?;
            run_with_store(&config, sink, source).await
        }
        DeviceBackend::Virtual => {
            let device = VirtualDevice::new();
            let feed =
                device.spawn_distance_feed(VIRTUAL_DISTANCES.to_vec(), Duration::from_secs(1));
            let (source, sink) = device.split();
            let result = run_with_store(&config, sink, source).await;
            feed.abort();
            result
        }
    }
}

async fn run_with_store<W, L>(config: &Config, sink: W, source: L) -> anyhow::Result<()>
where
    W: LineSink + 'static,
    L: LineSource,
{
    let paths = config.paths();
    let disk = FileSnapshotStore::new(&config.cache.path);

    match config.store.backend {
        StoreBackend::Mqtt => {
            let store = Arc::new(MqttStore::connect(
                config.store.mqtt.clone(),
                [
                    paths.actuator.as_str(),
                    paths.schedules.as_str(),
                    paths.level.as_str(),
                ],
            ));
            if let Err(err) = store.wait_connected().await {
                tracing::warn!(%err, "broker not reachable yet, continuing offline");
            }
            bridge::run(
                config,
                sink,
                source,
                Arc::clone(&store),
                disk,
                SystemClock,
                shutdown_signal(),
            )
            .await?;
            if let Err(err) = store.disconnect().await {
                tracing::warn!(%err, "could not disconnect from broker");
            }
        }
        StoreBackend::Virtual => {
            let store = Arc::new(VirtualStore::new());
            store.seed(&paths.schedules, json!({}));
            bridge::run(config, sink, source, store, disk, SystemClock, shutdown_signal()).await?;
        }
    }
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown requested");
}
