//! # doorwatch-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `DoorRepository` port defined in `doorwatch-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between door records and database rows
//!
//! Every save is committed with `synchronous = FULL`, so a record that was
//! saved survives a power cut.
//!
//! ## Dependency rule
//! Depends on `doorwatch-app` (for port traits) and `doorwatch-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod door_repo;
mod error;
mod pool;

pub use door_repo::SqliteDoorRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
