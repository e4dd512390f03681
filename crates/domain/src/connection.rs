//! Bus connection lifecycle.
//!
//! The transport adapter feeds observed events into a
//! [`ConnectionStateMachine`] and carries out the [`Directive`] it returns.
//! The machine itself never sleeps or touches the network.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──connack(0)──▶ Connected
//!      ▲                        │                          │
//!      └──── retry / refuse ────┘        peer drop ◀───────┤
//!                                   (DisconnectedUnexpected)│
//!                                        signal ──▶ Disconnecting
//! ```

use std::time::Duration;

use crate::error::NegotiationFailure;

/// Wait after a transport-level connect failure.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(10);
/// Wait after the broker reports itself unavailable.
pub const SERVER_UNAVAILABLE_DELAY: Duration = Duration::from_secs(30);
/// Wait after the broker drops an established session.
pub const UNEXPECTED_DISCONNECT_DELAY: Duration = Duration::from_secs(5);
/// Exit status when the broker refuses the session for good.
pub const NEGOTIATION_FAILURE_EXIT_CODE: i32 = 1;

/// Where the bus session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Operator-requested shutdown in progress.
    Disconnecting,
    /// Peer dropped the session; the transport will reconnect.
    DisconnectedUnexpected,
}

/// Broker connect acknowledgment code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnAckCode {
    Success,
    BadProtocolVersion,
    IdentifierRejected,
    ServerUnavailable,
    BadCredentials,
    NotAuthorized,
    Unknown(u8),
}

impl ConnAckCode {
    /// Numeric code as carried on the wire.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::BadProtocolVersion => 1,
            Self::IdentifierRejected => 2,
            Self::ServerUnavailable => 3,
            Self::BadCredentials => 4,
            Self::NotAuthorized => 5,
            Self::Unknown(code) => code,
        }
    }

    /// The permanent refusal this code represents, if any.
    ///
    /// `Success` and `ServerUnavailable` are not failures.
    #[must_use]
    pub fn failure(self) -> Option<NegotiationFailure> {
        match self {
            Self::Success | Self::ServerUnavailable => None,
            Self::BadProtocolVersion => Some(NegotiationFailure::BadProtocolVersion),
            Self::IdentifierRejected => Some(NegotiationFailure::IdentifierRejected),
            Self::BadCredentials => Some(NegotiationFailure::BadCredentials),
            Self::NotAuthorized => Some(NegotiationFailure::NotAuthorized),
            Self::Unknown(code) => Some(NegotiationFailure::Unknown(code)),
        }
    }
}

impl From<u8> for ConnAckCode {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::BadProtocolVersion,
            2 => Self::IdentifierRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadCredentials,
            5 => Self::NotAuthorized,
            other => Self::Unknown(other),
        }
    }
}

/// What the transport adapter must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Publish the retained online presence and start processing.
    AnnounceOnline,
    /// Sleep, then let the transport reconnect.
    Retry(Duration),
    /// Publish the retained offline presence, close the transport, then exit.
    Shutdown { exit_code: i32 },
    /// Stop the process without a presence update.
    Terminate {
        exit_code: i32,
        cause: Option<NegotiationFailure>,
    },
    /// Nothing to do.
    Ignore,
}

/// Explicit bus session lifecycle.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStateMachine {
    state: ConnectionState,
}

impl ConnectionStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The transport is opening a connection.
    pub fn connect_started(&mut self) {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::DisconnectedUnexpected => {
                self.state = ConnectionState::Connecting;
            }
            ConnectionState::Connecting
            | ConnectionState::Connected
            | ConnectionState::Disconnecting => {}
        }
    }

    /// The transport could not reach the broker at all.
    pub fn connect_failed(&mut self) -> Directive {
        if self.state == ConnectionState::Disconnecting {
            return Directive::Ignore;
        }
        self.state = ConnectionState::Disconnected;
        Directive::Retry(CONNECT_RETRY_DELAY)
    }

    /// The broker answered the connect request.
    pub fn connack(&mut self, code: ConnAckCode) -> Directive {
        if self.state == ConnectionState::Disconnecting {
            return Directive::Ignore;
        }
        match code {
            ConnAckCode::Success => {
                self.state = ConnectionState::Connected;
                Directive::AnnounceOnline
            }
            ConnAckCode::ServerUnavailable => {
                self.state = ConnectionState::Disconnected;
                Directive::Retry(SERVER_UNAVAILABLE_DELAY)
            }
            refused => {
                self.state = ConnectionState::Disconnected;
                Directive::Terminate {
                    exit_code: NEGOTIATION_FAILURE_EXIT_CODE,
                    cause: refused.failure(),
                }
            }
        }
    }

    /// The peer closed the session.
    ///
    /// A zero reason is a clean close and ends the process; anything else is
    /// retried.
    pub fn peer_disconnected(&mut self, reason: u8) -> Directive {
        if self.state == ConnectionState::Disconnecting {
            return Directive::Ignore;
        }
        if reason == 0 {
            self.state = ConnectionState::Disconnected;
            Directive::Terminate {
                exit_code: 0,
                cause: None,
            }
        } else {
            self.state = ConnectionState::DisconnectedUnexpected;
            Directive::Retry(UNEXPECTED_DISCONNECT_DELAY)
        }
    }

    /// The operator asked the process to stop with `signal`.
    pub fn shutdown_requested(&mut self, signal: i32) -> Directive {
        self.state = ConnectionState::Disconnecting;
        Directive::Shutdown { exit_code: signal }
    }

    /// The transport has closed after a requested shutdown.
    pub fn closed(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}
