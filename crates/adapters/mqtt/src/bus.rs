//! [`BusPublisher`] backed by a rumqttc client.

use std::future::Future;

use rumqttc::{AsyncClient, QoS};

use powermunin_app::ports::{BusMessage, BusPublisher, BusSession};
use powermunin_domain::error::MuninError;

use crate::error::MqttError;

/// Fire-and-forget publisher over the rumqttc request queue.
///
/// Messages are queued without waiting, so publishing never blocks the
/// serial loop or the network task; a full queue is reported as an error.
#[derive(Clone)]
pub struct MqttBus {
    client: AsyncClient,
}

impl MqttBus {
    pub(crate) fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl BusPublisher for MqttBus {
    fn publish(&self, message: BusMessage) -> impl Future<Output = Result<(), MuninError>> + Send {
        tracing::debug!(topic = %message.topic, payload = %message.payload, "publishing");
        let result = self
            .client
            .try_publish(
                message.topic,
                QoS::AtMostOnce,
                message.retain,
                message.payload,
            )
            .map_err(|err| MqttError::Client(err).into_domain());
        async move { result }
    }
}

impl BusSession for MqttBus {
    async fn publish_queued(&self, message: BusMessage) -> Result<(), MuninError> {
        self.client
            .publish(
                message.topic,
                QoS::AtMostOnce,
                message.retain,
                message.payload,
            )
            .await
            .map_err(|err| MqttError::Client(err).into_domain())
    }

    async fn disconnect(&self) -> Result<(), MuninError> {
        self.client
            .disconnect()
            .await
            .map_err(|err| MqttError::Client(err).into_domain())
    }
}
