//! Presence service — retained online/offline announcements.

use powermunin_domain::error::MuninError;
use powermunin_domain::topic::Presence;

use crate::ports::{BusMessage, BusPublisher, BusSession};

/// Announces this daemon's state on the retained presence topic.
pub struct PresenceService<P> {
    publisher: P,
    topic: String,
}

impl<P: BusPublisher> PresenceService<P> {
    pub fn new(publisher: P, topic: impl Into<String>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }

    /// The message the broker should publish if this client vanishes.
    #[must_use]
    pub fn last_will(&self) -> BusMessage {
        BusMessage::retained(&self.topic, Presence::Offline.payload())
    }

    /// Publish the retained presence payload for `presence`.
    ///
    /// # Errors
    ///
    /// Returns the publisher's error when the message cannot be queued.
    #[tracing::instrument(skip(self), fields(topic = %self.topic))]
    pub async fn announce(&self, presence: Presence) -> Result<(), MuninError> {
        self.publisher
            .publish(BusMessage::retained(&self.topic, presence.payload()))
            .await
    }
}

impl<P: BusSession> PresenceService<P> {
    /// Announce offline, then close the session.
    ///
    /// The disconnect is requested even when the offline message could not
    /// be queued; the broker then falls back to the last will.
    ///
    /// # Errors
    ///
    /// Returns the session's error when the disconnect cannot be queued.
    #[tracing::instrument(skip(self), fields(topic = %self.topic))]
    pub async fn sign_off(&self) -> Result<(), MuninError> {
        if let Err(err) = self.publisher.publish_queued(self.last_will()).await {
            tracing::error!(error = ?err, "failed to queue offline presence");
        }
        self.publisher.disconnect().await
    }
}
