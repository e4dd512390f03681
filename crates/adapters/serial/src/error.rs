//! Serial adapter error types.

use powermunin_domain::error::MuninError;

/// Errors specific to the serial adapter.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {path}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Reading from an open port failed.
    #[error("failed to read from serial port")]
    Read(#[source] std::io::Error),

    /// The port reported end of stream.
    #[error("serial port closed")]
    Closed,
}

impl SerialError {
    /// Convert into a [`MuninError::Transport`].
    #[must_use]
    pub fn into_domain(self) -> MuninError {
        MuninError::Transport(Box::new(self))
    }
}

impl From<SerialError> for MuninError {
    fn from(err: SerialError) -> Self {
        err.into_domain()
    }
}
