//! # doorwatch-adapter-virtual
//!
//! Virtual adapters that stand in for real hardware and a real messaging
//! gateway, for demos and tests.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualDoorHardware`] | `DoorSensor` + `DoorActuator` | Per-door simulated position; a pulse toggles it unless jammed |
//! | [`VirtualGateway`] | `Notifier` | Logs each message and keeps it in an outbox |
//!
//! ## Dependency rule
//!
//! Depends on `doorwatch-app` (port traits) and `doorwatch-domain` only.

mod gateway;
mod hardware;

pub use gateway::{SentMessage, VirtualGateway};
pub use hardware::VirtualDoorHardware;
