//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`DoorwatchError`] via `From` when crossing a port boundary.

/// Top-level error shared by the domain, the application layer and the
/// port traits.
#[derive(Debug, thiserror::Error)]
pub enum DoorwatchError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The persistence store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The door hardware could not be set up or driven.
    #[error("hardware error")]
    Hardware(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The notification gateway failed to deliver a message.
    #[error("notification error")]
    Notification(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A door name must not be empty or blank.
    #[error("door name must not be empty")]
    EmptyDoorName,

    /// A recipient identifier must not be empty or blank.
    #[error("recipient must not be empty")]
    EmptyRecipient,

    /// Two doors share the same name or abbreviation.
    #[error("duplicate door {0:?}")]
    DuplicateDoor(String),

    /// A door abbreviation is blank, contains whitespace, or collides with
    /// a command word.
    #[error("invalid door abbreviation {0:?}")]
    InvalidAbbreviation(String),
}
