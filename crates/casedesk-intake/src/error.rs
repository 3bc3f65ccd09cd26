//! Error types for intake operations.

use casedesk_persistence::PersistenceError;
use thiserror::Error;

use crate::conversation::Stage;

/// Errors that can occur during intake.
///
/// None of these is fatal: the conversation turns them into bot messages and
/// stays in a continuable stage.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// User input failed validation (malformed email).
    #[error("invalid input: {0}")]
    Validation(String),

    /// No persistence store is configured or reachable.
    #[error("store unavailable: {0}")]
    DependencyUnavailable(String),

    /// A store call failed while creating the user, profile or ticket.
    #[error("{0}")]
    CreationFailure(String),

    /// A ticket-status query found nothing.
    #[error("ticket not found: {0}")]
    LookupNotFound(String),

    /// The operation is not allowed in the current stage.
    #[error("cannot {action} while {stage}")]
    InvalidStage { action: &'static str, stage: Stage },

    /// The conversation was closed.
    #[error("conversation is closed")]
    Closed,

    /// Persistence error outside of ticket creation.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
