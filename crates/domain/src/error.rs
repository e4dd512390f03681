//! Common error types used across the workspace.
//!
//! [`MuninError`] is the closed taxonomy every layer converts into. Each
//! variant carries a typed source; adapters wrap their own library errors in
//! [`MuninError::Transport`].

/// Top-level error for the collector.
#[derive(Debug, thiserror::Error)]
pub enum MuninError {
    /// Serial or bus transport failure. Recoverable, retried by the caller.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A data line inside a frame could not be decoded.
    #[error("frame error")]
    Frame(#[from] FrameError),

    /// A decoded record failed its XOR checksum.
    #[error("checksum error")]
    Checksum(#[from] ChecksumError),

    /// A derived reading was outside the plausible power range.
    #[error("plausibility reject")]
    PlausibilityReject(#[from] PlausibilityReject),

    /// The broker refused the session.
    #[error("negotiation failure")]
    Negotiation(#[from] NegotiationFailure),

    /// A device definition violates a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),
}

impl MuninError {
    /// Whether this error aborts the rest of the current frame.
    ///
    /// Unknown devices only discard their own line; plausibility rejects are
    /// not errors but still stop the frame.
    #[must_use]
    pub fn aborts_frame(&self) -> bool {
        match self {
            Self::Frame(FrameError::UnknownDevice(_)) => false,
            Self::Frame(_) | Self::Checksum(_) | Self::PlausibilityReject(_) => true,
            Self::Transport(_) | Self::Negotiation(_) | Self::Validation(_) => false,
        }
    }
}

/// Reasons a data line could not be decoded into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The line did not contain exactly four fields.
    #[error("wrong number of entries on line {line:?}: expected 4, got {actual}")]
    FieldCount {
        /// The offending line.
        line: String,
        /// Number of fields found.
        actual: usize,
    },

    /// A field was not a decimal integer.
    #[error("invalid integer {token:?} on line {line:?}")]
    InvalidInteger {
        /// The offending line.
        line: String,
        /// The token that failed to parse.
        token: String,
    },

    /// The record names a device that is not in the registry.
    #[error("unknown device id {0}")]
    UnknownDevice(i64),
}

/// A record whose fields do not XOR to its checksum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("checksum mismatch on line {line:?}: expected {expected}, computed {computed}")]
pub struct ChecksumError {
    /// The offending line.
    pub line: String,
    /// Checksum carried by the line.
    pub expected: i64,
    /// XOR of the three data fields.
    pub computed: i64,
}

/// A reading discarded as meter noise.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("suspicious instant power {watts} W")]
pub struct PlausibilityReject {
    /// The rejected instantaneous power.
    pub watts: f64,
}

/// Why the broker refused a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationFailure {
    #[error("connection refused - unacceptable protocol version")]
    BadProtocolVersion,
    #[error("connection refused - identifier rejected")]
    IdentifierRejected,
    #[error("connection refused - bad user name or password")]
    BadCredentials,
    #[error("connection refused - not authorised")]
    NotAuthorized,
    #[error("connection refused - unknown return code {0}")]
    Unknown(u8),
}

/// Domain invariant violations on device definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("device name must not be empty")]
    EmptyName,
    #[error("pulses per kWh must be positive")]
    ZeroCalibration,
    #[error("duplicate device id {0}")]
    DuplicateDevice(u32),
}
