//! # powermunin-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `BusPublisher` — fire-and-forget publish to the message bus
//!   - `BusSession` — queued publish and clean disconnect on shutdown
//! - Define **use-cases**:
//!   - `Collector` — decoded frame → power derivation → per-device
//!     aggregation → publish gate → bus
//!   - `PresenceService` — retained online/offline announcements
//! - Orchestrate domain objects without knowing *how* bytes arrive or how
//!   the bus is reached
//!
//! ## Dependency rule
//! Depends on `powermunin-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
