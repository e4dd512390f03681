//! # powermunin-adapter-serial
//!
//! Serial adapter — reads the pulse meter over a tokio-serial port.
//!
//! ## Responsibilities
//! - Open the configured device, retrying until it appears
//! - Read with a bounded timeout; silence is not an error
//! - Reopen after read failures or end of stream
//! - Feed the domain frame parser and forward complete frames over a channel
//!
//! ## Dependency rule
//! Depends on `powermunin-domain` only; decoding and publishing happen upstream.

mod config;
mod error;
mod reader;

pub use config::SerialConfig;
pub use error::SerialError;
pub use reader::{MAX_BUFFERED_BYTES, SerialReader};
