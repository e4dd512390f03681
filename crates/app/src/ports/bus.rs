//! Bus port — publishing messages to the publish/subscribe bus.

use std::future::Future;

use powermunin_domain::error::MuninError;

/// One message bound for the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
    /// Whether the broker keeps this as the topic's last known value.
    pub retain: bool,
}

impl BusMessage {
    /// A non-retained message.
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }

    /// A retained message.
    #[must_use]
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            retain: true,
            ..Self::new(topic, payload)
        }
    }
}

/// Hands messages to the bus transport.
///
/// Implementations must not wait for broker acknowledgment: the future
/// resolves once the message is queued.
pub trait BusPublisher {
    /// Queue a message for delivery.
    fn publish(&self, message: BusMessage) -> impl Future<Output = Result<(), MuninError>> + Send;
}

impl<T: BusPublisher + Send + Sync> BusPublisher for std::sync::Arc<T> {
    fn publish(&self, message: BusMessage) -> impl Future<Output = Result<(), MuninError>> + Send {
        (**self).publish(message)
    }
}

/// A publisher whose connection can be closed on request.
pub trait BusSession: BusPublisher {
    /// Queue a message, waiting for room in the transport queue instead of
    /// failing when it is full.
    fn publish_queued(
        &self,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), MuninError>> + Send;

    /// Queue a clean disconnect behind every message already queued.
    fn disconnect(&self) -> impl Future<Output = Result<(), MuninError>> + Send;
}

impl<T: BusSession + Send + Sync> BusSession for std::sync::Arc<T> {
    fn publish_queued(
        &self,
        message: BusMessage,
    ) -> impl Future<Output = Result<(), MuninError>> + Send {
        (**self).publish_queued(message)
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), MuninError>> + Send {
        (**self).disconnect()
    }
}
