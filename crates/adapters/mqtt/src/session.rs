//! Broker session — drives the rumqttc event loop through the connection
//! state machine.
//!
//! The network task owns the [`EventLoop`]. Every connect, acknowledgment and
//! drop it observes is fed into the shared [`ConnectionStateMachine`], and the
//! returned [`Directive`] is carried out by the [`Handler`]: announce
//! presence, back off, or ask the main loop to terminate via a [`BusEvent`].

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, LastWill, MqttOptions,
    Outgoing, Packet, QoS,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use powermunin_app::ports::{BusPublisher, BusSession};
use powermunin_app::services::presence::PresenceService;
use powermunin_domain::connection::{
    ConnAckCode, ConnectionState, ConnectionStateMachine, Directive,
};
use powermunin_domain::error::NegotiationFailure;
use powermunin_domain::topic::{Presence, Topics};

use crate::bus::MqttBus;
use crate::config::MqttConfig;

const REQUEST_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 16;
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
/// Reason reported for a session lost without a broker-side close.
const CONNECTION_LOST: u8 = 1;

/// Session changes the main loop needs to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Connected and presence announced.
    Online,
    /// Not connected; the session is backing off before reconnecting.
    Offline,
    /// The session ended for good; the process should exit.
    Terminate { exit_code: i32 },
}

/// A running broker session.
pub struct MqttSession {
    bus: MqttBus,
    presence: PresenceService<MqttBus>,
    machine: Arc<Mutex<ConnectionStateMachine>>,
    handle: JoinHandle<()>,
}

impl MqttSession {
    /// Configure the client (last will included) and spawn the network task.
    ///
    /// Returns the session handle and the stream of [`BusEvent`]s.
    pub fn start(
        config: &MqttConfig,
        client_id: &str,
        topics: &Topics,
    ) -> (Self, mpsc::Receiver<BusEvent>) {
        let options = options(config, client_id, topics);
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let bus = MqttBus::new(client);
        let machine = Arc::new(Mutex::new(ConnectionStateMachine::new()));
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);

        let handler = Handler {
            machine: Arc::clone(&machine),
            presence: PresenceService::new(bus.clone(), topics.presence()),
            events: events_tx,
            broker: format!("{}:{}", config.host, config.port),
        };
        tracing::debug!(broker = %handler.broker, client_id, "connecting");
        let handle = tokio::spawn(drive(eventloop, handler));

        let presence = PresenceService::new(bus.clone(), topics.presence());
        let session = Self {
            bus,
            presence,
            machine,
            handle,
        };
        (session, events_rx)
    }

    /// Publisher handle sharing this session's connection.
    #[must_use]
    pub fn bus(&self) -> MqttBus {
        self.bus.clone()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        lock(&self.machine).state()
    }

    /// Announce offline, close the connection and wait for the network task.
    ///
    /// Returns the exit status for the process.
    pub async fn shutdown(self, signal: i32) -> i32 {
        let exit_code = sign_off(&self.machine, &self.presence, signal).await;

        let abort = self.handle.abort_handle();
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.handle).await.is_err() {
            tracing::warn!("broker session did not close in time");
            abort.abort();
        }
        lock(&self.machine).closed();
        exit_code
    }
}

/// Enter `Disconnecting`, queue the offline presence and then the disconnect.
///
/// Returns the exit status, which is the signal number.
async fn sign_off<P: BusSession>(
    machine: &Mutex<ConnectionStateMachine>,
    presence: &PresenceService<P>,
    signal: i32,
) -> i32 {
    let directive = lock(machine).shutdown_requested(signal);
    let exit_code = match directive {
        Directive::Shutdown { exit_code } => exit_code,
        _ => signal,
    };

    tracing::info!("disconnecting from broker");
    if let Err(err) = presence.sign_off().await {
        tracing::error!(error = ?err, "failed to queue disconnect");
    }
    exit_code
}

fn options(config: &MqttConfig, client_id: &str, topics: &Topics) -> MqttOptions {
    let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    options.set_clean_session(true);
    // The will must be registered before the first connect.
    options.set_last_will(LastWill::new(
        topics.presence(),
        Presence::Offline.payload(),
        QoS::AtMostOnce,
        true,
    ));
    options
}

fn lock(machine: &Mutex<ConnectionStateMachine>) -> MutexGuard<'_, ConnectionStateMachine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

fn connack_code(code: &ConnectReturnCode) -> ConnAckCode {
    match code {
        ConnectReturnCode::Success => ConnAckCode::Success,
        ConnectReturnCode::RefusedProtocolVersion => ConnAckCode::BadProtocolVersion,
        ConnectReturnCode::BadClientId => ConnAckCode::IdentifierRejected,
        ConnectReturnCode::ServiceUnavailable => ConnAckCode::ServerUnavailable,
        ConnectReturnCode::BadUserNamePassword => ConnAckCode::BadCredentials,
        ConnectReturnCode::NotAuthorized => ConnAckCode::NotAuthorized,
    }
}

/// Network task: poll the event loop and hand every outcome to `handler`.
///
/// The event loop is only borrowed for the duration of `poll`, never while
/// the handler awaits.
async fn drive(mut eventloop: EventLoop, handler: Handler<MqttBus>) {
    loop {
        lock(&handler.machine).connect_started();

        let step = match eventloop.poll().await {
            Ok(event) => handler.on_event(&event),
            Err(err) => handler.on_error(&err),
        };
        let ControlFlow::Continue(directive) = step else {
            break;
        };
        if handler.apply(directive).await.is_break() {
            break;
        }
    }
    tracing::debug!("broker session ended");
}

/// Turns transport events into state machine transitions and carries out
/// the resulting directives.
struct Handler<P> {
    machine: Arc<Mutex<ConnectionStateMachine>>,
    presence: PresenceService<P>,
    events: mpsc::Sender<BusEvent>,
    broker: String,
}

impl<P: BusPublisher> Handler<P> {
    fn on_event(&self, event: &Event) -> ControlFlow<(), Directive> {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                let code = connack_code(&ack.code);
                tracing::debug!(code = code.code(), "connect acknowledged");
                ControlFlow::Continue(lock(&self.machine).connack(code))
            }
            Event::Incoming(Packet::Disconnect) => {
                tracing::info!("clean disconnection");
                ControlFlow::Continue(lock(&self.machine).peer_disconnected(0))
            }
            Event::Outgoing(Outgoing::Publish(pkid)) => {
                tracing::debug!(pkid, "published");
                ControlFlow::Continue(Directive::Ignore)
            }
            Event::Incoming(Packet::PubAck(ack)) => {
                tracing::debug!(pkid = ack.pkid, "publish acknowledged");
                ControlFlow::Continue(Directive::Ignore)
            }
            Event::Outgoing(Outgoing::Disconnect) => {
                let mut machine = lock(&self.machine);
                if machine.state() == ConnectionState::Disconnecting {
                    machine.closed();
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(Directive::Ignore)
                }
            }
            other => {
                tracing::trace!(event = ?other, "mqtt event");
                ControlFlow::Continue(Directive::Ignore)
            }
        }
    }

    fn on_error(&self, err: &ConnectionError) -> ControlFlow<(), Directive> {
        let mut machine = lock(&self.machine);
        if machine.state() == ConnectionState::Disconnecting {
            machine.closed();
            return ControlFlow::Break(());
        }

        let directive = match err {
            ConnectionError::ConnectionRefused(code) => machine.connack(connack_code(code)),
            _ if machine.state() == ConnectionState::Connected => {
                tracing::error!(error = %err, "unexpected disconnection");
                machine.peer_disconnected(CONNECTION_LOST)
            }
            _ => {
                tracing::error!(error = %err, broker = %self.broker, "connection failed");
                machine.connect_failed()
            }
        };
        ControlFlow::Continue(directive)
    }

    async fn apply(&self, directive: Directive) -> ControlFlow<()> {
        match directive {
            Directive::AnnounceOnline => {
                tracing::info!(broker = %self.broker, "connected");
                if let Err(err) = self.presence.announce(Presence::Online).await {
                    tracing::error!(error = ?err, "failed to announce presence");
                }
                self.notify(BusEvent::Online).await;
            }
            Directive::Retry(delay) => {
                self.notify(BusEvent::Offline).await;
                tracing::info!(delay_secs = delay.as_secs(), "reconnecting after delay");
                tokio::time::sleep(delay).await;
            }
            Directive::Terminate { exit_code, cause } => {
                match cause {
                    Some(NegotiationFailure::Unknown(code)) => {
                        tracing::warn!(code, "something went wrong");
                    }
                    Some(failure) => tracing::error!(%failure, "giving up on broker"),
                    None => tracing::info!("broker closed the session"),
                }
                self.notify(BusEvent::Terminate { exit_code }).await;
                return ControlFlow::Break(());
            }
            Directive::Shutdown { .. } | Directive::Ignore => {}
        }
        ControlFlow::Continue(())
    }

    async fn notify(&self, event: BusEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!(?event, "no listener for bus event");
        }
    }
}
