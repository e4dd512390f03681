//! # powermunin-adapter-mqtt
//!
//! MQTT adapter — publishes power summaries and presence to a broker.
//!
//! ## Responsibilities
//! - Configure the rumqttc client, including the retained offline last will
//! - Drive the event loop through the domain connection state machine
//! - Implement the [`BusPublisher`](powermunin_app::ports::BusPublisher) port
//! - Announce offline presence and disconnect cleanly on shutdown
//!
//! ## Dependency rule
//! Same as other adapters: depends on `powermunin-app` and `powermunin-domain`.

mod bus;
mod config;
mod error;
mod session;

pub use bus::MqttBus;
pub use config::MqttConfig;
pub use error::MqttError;
pub use session::{BusEvent, MqttSession};
