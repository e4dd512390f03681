//! MQTT adapter error types.

use powermunin_domain::error::MuninError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc request queue rejected a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// A domain-level error (negotiation failure, etc.).
    #[error("domain error")]
    Domain(#[source] MuninError),
}

impl MqttError {
    /// Convert into a [`MuninError::Transport`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> MuninError {
        match self {
            Self::Domain(err) => err,
            other => MuninError::Transport(Box::new(other)),
        }
    }
}

impl From<MqttError> for MuninError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
