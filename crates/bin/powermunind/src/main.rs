//! # powermunind — power meter daemon
//!
//! Composition root that wires the adapters together and runs the collector.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install logging
//! - Load the device table
//! - Start the MQTT session and the serial reader
//! - Run decoded frames through the collector
//! - Handle graceful shutdown (SIGTERM/SIGINT) and broker-initiated termination
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod host;
mod logging;

use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use powermunin_adapter_mqtt::{BusEvent, MqttSession};
use powermunin_adapter_serial::SerialReader;
use powermunin_app::services::collector::{Collector, FrameOutcome};
use powermunin_domain::time;
use powermunin_domain::topic::{APP_NAME, Topics};

use crate::config::Config;

const SIGINT: i32 = 2;
const SIGTERM: i32 = 15;
const FRAME_CAPACITY: usize = 16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let guard = logging::init(&config.logging)?;

    let exit_code = run(config).await?;

    drop(guard);
    std::process::exit(exit_code);
}

async fn run(config: Config) -> Result<i32, Box<dyn std::error::Error>> {
    tracing::info!(app = APP_NAME, version = env!("CARGO_PKG_VERSION"), "starting");
    tracing::debug!(?config, "configuration loaded");

    let registry = Arc::new(powermunin_adapter_device_table::load(&config.devices.file)?);

    let fqdn = config.mqtt.hostname.clone().unwrap_or_else(host::fqdn);
    let topics = Topics::new(&fqdn, APP_NAME, &config.mqtt.subtopic);
    let client_id = config
        .mqtt
        .client_id
        .clone()
        .unwrap_or_else(|| format!("{APP_NAME}_{}", std::process::id()));

    let (session, mut bus_events) = MqttSession::start(&config.mqtt, &client_id, &topics);
    let mut collector = Collector::new(
        registry,
        topics,
        config.publish.interval(),
        session.bus(),
        time::now(),
    );

    let (frames_tx, mut frames) = mpsc::channel(FRAME_CAPACITY);
    let reader = tokio::spawn(SerialReader::new(config.serial.clone(), frames_tx).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let exit_code = loop {
        tokio::select! {
            Some(frame) = frames.recv() => {
                let report = collector.process_frame(&frame, time::now()).await;
                if let FrameOutcome::Suspicious(reject) = &report.outcome {
                    tracing::debug!(watts = reject.watts, "frame stopped at suspicious reading");
                }
                tracing::debug!(
                    accepted = report.accepted,
                    unknown = report.unknown,
                    published = report.published,
                    "frame processed"
                );
            }
            Some(event) = bus_events.recv() => match event {
                BusEvent::Terminate { exit_code } => {
                    tracing::info!(exit_code, "broker session ended, exiting");
                    break exit_code;
                }
                BusEvent::Online | BusEvent::Offline => {
                    tracing::debug!(?event, state = ?session.state(), "bus state changed");
                }
            },
            _ = sigterm.recv() => {
                tracing::info!(signal = SIGTERM, "exiting on signal");
                break session.shutdown(SIGTERM).await;
            }
            _ = sigint.recv() => {
                tracing::info!(signal = SIGINT, "exiting on signal");
                break session.shutdown(SIGINT).await;
            }
        }
    };

    reader.abort();
    Ok(exit_code)
}
