//! End-to-end tests for the collector pipeline.
//!
//! Each test loads a real device table from disk, streams raw meter bytes
//! through the frame parser in arbitrary chunks and runs every frame through
//! the collector against a recording publisher. No serial port or broker is
//! involved.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use powermunin_app::ports::{BusMessage, BusPublisher};
use powermunin_app::services::collector::{Collector, FrameOutcome};
use powermunin_domain::device::DeviceId;
use powermunin_domain::error::MuninError;
use powermunin_domain::frame::{Frame, FrameParser};
use powermunin_domain::time::Timestamp;
use powermunin_domain::topic::{APP_NAME, Topics};

#[derive(Default)]
struct RecordingBus {
    messages: Mutex<Vec<BusMessage>>,
}

impl RecordingBus {
    fn take(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .unwrap()
            .drain(..)
            .map(|message| (message.topic, message.payload))
            .collect()
    }
}

impl BusPublisher for RecordingBus {
    async fn publish(&self, message: BusMessage) -> Result<(), MuninError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn collector(bus: Arc<RecordingBus>) -> Collector<Arc<RecordingBus>> {
    let mut table = tempfile::NamedTempFile::new().unwrap();
    writeln!(table, "# id, name, pulses per kWh").unwrap();
    writeln!(table, "1, oven, 1000").unwrap();
    writeln!(table, "2, heatpump, 500").unwrap();
    let registry = powermunin_adapter_device_table::load(table.path()).unwrap();

    Collector::new(
        Arc::new(registry),
        Topics::new("meter.lan", APP_NAME, "/power/"),
        Duration::from_secs(60),
        bus,
        at(0),
    )
}

/// Feed `stream` to a parser a few bytes at a time, as a serial port would.
fn frames(stream: &[u8]) -> Vec<Frame> {
    let mut parser = FrameParser::new();
    let mut frames = Vec::new();
    for chunk in stream.chunks(7) {
        parser.extend(chunk);
        frames.extend(parser.frames());
    }
    assert_eq!(parser.buffered_len(), 0);
    frames
}

#[tokio::test]
async fn should_publish_only_once_the_interval_has_elapsed() {
    let bus = Arc::new(RecordingBus::default());
    let mut collector = collector(Arc::clone(&bus));
    let frames = frames(
        b"+\r\n1 100 360000 359973\r\n-\r\n\
          +\r\n2 50 7200 7184\r\n-\r\n\
          +\r\n1 100 360000 359973\r\n-\r\n",
    );
    assert_eq!(frames.len(), 3);

    collector.process_frame(&frames[0], at(10)).await;
    assert!(bus.take().is_empty());

    let report = collector.process_frame(&frames[1], at(61)).await;
    assert_eq!(report.published, 1);
    assert_eq!(
        bus.take(),
        [
            (
                "raw/meter.lan/power/heatpump/watthours".to_string(),
                "100.0".to_string()
            ),
            (
                "raw/meter.lan/power/heatpump/watts".to_string(),
                "5000".to_string()
            ),
        ]
    );

    // The gate is shared, so the oven waits for the next window.
    collector.process_frame(&frames[2], at(70)).await;
    assert!(bus.take().is_empty());
    assert_eq!(collector.samples().get(DeviceId::new(1)).unwrap().count(), 2);
}

#[tokio::test]
async fn should_abort_frame_on_corrupt_line_and_recover_on_next() {
    let bus = Arc::new(RecordingBus::default());
    let mut collector = collector(Arc::clone(&bus));
    let frames = frames(
        b"+\r\n1 100 360000 101\r\n2 50 7200 7184\r\n-\r\n\
          +\r\n2 50 7200 7184\r\n-\r\n",
    );

    let report = collector.process_frame(&frames[0], at(61)).await;
    assert!(matches!(
        report.outcome,
        FrameOutcome::Aborted(MuninError::Checksum(_))
    ));
    assert_eq!(report.accepted, 0);
    assert!(bus.take().is_empty());

    let report = collector.process_frame(&frames[1], at(62)).await;
    assert!(matches!(report.outcome, FrameOutcome::Complete));
    assert_eq!(report.published, 1);
    assert_eq!(bus.take().len(), 2);
}

#[tokio::test]
async fn should_skip_unknown_devices_without_dropping_the_frame() {
    let bus = Arc::new(RecordingBus::default());
    let mut collector = collector(Arc::clone(&bus));
    let frames = frames(b"+\r\n9 1 1 9\r\n1 100 360000 359973\r\n-\r\n");

    let report = collector.process_frame(&frames[0], at(61)).await;

    assert_eq!(report.unknown, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(
        bus.take(),
        [
            (
                "raw/meter.lan/power/oven/watthours".to_string(),
                "100.0".to_string()
            ),
            (
                "raw/meter.lan/power/oven/watts".to_string(),
                "100".to_string()
            ),
        ]
    );
}
