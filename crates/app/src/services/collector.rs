//! Collector — turns meter frames into published power summaries.
//!
//! For each record of a frame, in order:
//!
//! 1. resolve the device in the registry (unknown ids drop the record)
//! 2. derive watt-hours and instantaneous watts (implausible power stops the frame)
//! 3. add the reading to the device's sample store
//! 4. if the global publish gate is due, publish this record's watt-hours and
//!    the rounded average watts, then reset the device's store
//!
//! Decoding errors (field count, integer syntax, checksum) abandon the rest
//! of the frame.

use std::sync::Arc;
use std::time::Duration;

use powermunin_domain::device::Device;
use powermunin_domain::error::{MuninError, PlausibilityReject};
use powermunin_domain::frame::Frame;
use powermunin_domain::power::{self, Reading};
use powermunin_domain::publish_gate::PublishGate;
use powermunin_domain::record::Record;
use powermunin_domain::registry::DeviceRegistry;
use powermunin_domain::sample::SampleAggregator;
use powermunin_domain::time::Timestamp;
use powermunin_domain::topic::Topics;

use crate::ports::{BusMessage, BusPublisher};

/// How processing of a frame ended.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Every line was handled.
    Complete,
    /// A line failed to decode; later lines were skipped.
    Aborted(MuninError),
    /// A reading was implausible; it and later lines were skipped.
    Suspicious(PlausibilityReject),
}

/// Summary of one processed frame.
#[derive(Debug)]
pub struct FrameReport {
    /// Readings added to a sample store.
    pub accepted: usize,
    /// Records dropped because their device is not registered.
    pub unknown: usize,
    /// Flushes whose messages were all accepted by the bus.
    pub published: usize,
    pub outcome: FrameOutcome,
}

/// Application service owning the per-device samples and the publish gate.
pub struct Collector<P> {
    registry: Arc<DeviceRegistry>,
    samples: SampleAggregator,
    gate: PublishGate,
    topics: Topics,
    publisher: P,
}

impl<P: BusPublisher> Collector<P> {
    /// Create a collector with an empty store per registered device.
    ///
    /// The first publish window starts at `now`.
    pub fn new(
        registry: Arc<DeviceRegistry>,
        topics: Topics,
        interval: Duration,
        publisher: P,
        now: Timestamp,
    ) -> Self {
        Self {
            samples: SampleAggregator::for_registry(&registry),
            registry,
            gate: PublishGate::new(interval, now),
            topics,
            publisher,
        }
    }

    /// Per-device running statistics.
    #[must_use]
    pub fn samples(&self) -> &SampleAggregator {
        &self.samples
    }

    /// The shared publish gate.
    #[must_use]
    pub fn gate(&self) -> &PublishGate {
        &self.gate
    }

    /// Process every record of `frame` as observed at `now`.
    #[tracing::instrument(skip_all, fields(lines = frame.lines().len()))]
    pub async fn process_frame(&mut self, frame: &Frame, now: Timestamp) -> FrameReport {
        let registry = Arc::clone(&self.registry);
        let mut report = FrameReport {
            accepted: 0,
            unknown: 0,
            published: 0,
            outcome: FrameOutcome::Complete,
        };

        for decoded in frame.decode(&registry) {
            let (record, device) = match decoded {
                Ok(pair) => pair,
                Err(err) if err.aborts_frame() => {
                    tracing::error!(error = ?err, "discarding rest of frame");
                    report.outcome = FrameOutcome::Aborted(err);
                    break;
                }
                Err(err) => {
                    tracing::error!(error = ?err, "discarding record");
                    report.unknown += 1;
                    continue;
                }
            };

            let reading = match power::derive(
                record.pulse_count,
                record.last_pulse_interval,
                device.pulses_per_kwh,
            ) {
                Ok(reading) => reading,
                Err(reject) => {
                    tracing::info!(
                        input = record.device_id,
                        watts = reject.watts,
                        "suspicious instant power, ignoring"
                    );
                    report.outcome = FrameOutcome::Suspicious(reject);
                    break;
                }
            };

            report.accepted += 1;
            if self.accept(&record, device, reading, now).await {
                report.published += 1;
            }
        }

        report
    }

    /// Aggregate one reading and flush it if the gate allows.
    ///
    /// Returns whether a flush was delivered. A failed flush still consumes
    /// the gate but keeps the samples for the next window.
    async fn accept(
        &mut self,
        record: &Record,
        device: &Device,
        reading: Reading,
        now: Timestamp,
    ) -> bool {
        let Some(store) = self.samples.add(device.id, reading.instant_watts) else {
            tracing::error!(input = record.device_id, "no sample store for device");
            return false;
        };
        let average = store.average().unwrap_or(reading.instant_watts);

        tracing::info!(
            "input {} [{}]: {} pulses: {:.1} Wh {:.0} W (avg {:.0} W)",
            record.device_id,
            device.name,
            record.pulse_count,
            reading.watt_hours,
            reading.instant_watts,
            average,
        );

        if !self.gate.try_acquire(now) {
            return false;
        }

        let messages = [
            BusMessage::new(
                self.topics.watt_hours(&device.name),
                format_watt_hours(reading.watt_hours),
            ),
            BusMessage::new(self.topics.watts(&device.name), format_watts(average)),
        ];

        let mut delivered = true;
        for message in messages {
            let topic = message.topic.clone();
            if let Err(err) = self.publisher.publish(message).await {
                tracing::error!(error = ?err, %topic, "publish failed");
                delivered = false;
            }
        }

        if delivered {
            tracing::debug!(device = %device.name, "flushed samples");
            self.samples.reset(device.id);
        }
        delivered
    }
}

/// Plain decimal with at least one fractional digit (`100.0`, `1.25`).
fn format_watt_hours(watt_hours: f64) -> String {
    let formatted = watt_hours.to_string();
    if watt_hours.is_finite() && !formatted.contains('.') {
        format!("{formatted}.0")
    } else {
        formatted
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_watts(average: f64) -> String {
    (average.round() as i64).to_string()
}
