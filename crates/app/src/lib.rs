//! # doorwatch-app
//!
//! Application layer — the door controller and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DoorSensor` / `DoorActuator` — the door hardware
//!   - `Notifier` — the notification gateway
//!   - `DoorRepository` — durable per-door records
//!   - `Liveness` — watchdog beats from the command loop
//! - Run the per-door **state machine** (`DoorController`): debouncing,
//!   the button protocol, reminder timers, subscriptions and history
//! - Provide **in-process infrastructure** that doesn't need IO: the shared
//!   `HardwareBus` lock, the `TimerScheduler`, the `SensorWatch` poller and
//!   the `NightlyCheck`
//! - Define **driving/inbound ports**: `CommandService` and `CommandLoop`
//!
//! ## Dependency rule
//! Depends on `doorwatch-domain` only (plus `tokio` for tasks, locks and time).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bus;
pub mod command_loop;
pub mod door_controller;
pub mod nightly;
pub mod ports;
pub mod scheduler;
pub mod sensor_watch;
pub mod services;

#[cfg(test)]
mod testing;
