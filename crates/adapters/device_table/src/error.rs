//! Device table error types.

use std::path::PathBuf;

use powermunin_domain::error::MuninError;

/// Errors raised while loading the device table.
#[derive(Debug, thiserror::Error)]
pub enum DeviceTableError {
    /// The file could not be opened.
    #[error("failed to open device table {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row could not be read or did not have the expected columns.
    #[error("invalid device table row")]
    Row(#[source] csv::Error),

    /// A row was well-formed but violates a device invariant.
    #[error("domain error")]
    Domain(#[source] MuninError),
}

impl DeviceTableError {
    /// Convert into a [`MuninError`], keeping domain validation errors as-is.
    #[must_use]
    pub fn into_domain(self) -> MuninError {
        match self {
            Self::Domain(err) => err,
            other => MuninError::Transport(Box::new(other)),
        }
    }
}

impl From<DeviceTableError> for MuninError {
    fn from(err: DeviceTableError) -> Self {
        err.into_domain()
    }
}
