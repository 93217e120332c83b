//! # doorwatch-domain
//!
//! Pure domain model for the doorwatch door monitor.
//!
//! ## Responsibilities
//! - Foundational types: door names, recipients, error conventions, timestamps
//! - Define **door state** (confirmed position vs. raw sensor reading)
//! - Define **events** (the closed set of notification types and their messages)
//! - Define the **subscription registry** and the **history log**
//! - Define the **persisted record** of a door
//! - Parse **commands** received from the inbound transport
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod command;
pub mod door;
pub mod event;
pub mod history;
pub mod record;
pub mod subscription;
