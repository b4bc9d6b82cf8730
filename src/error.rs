use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("invalid sample at {timestamp}: {reason}")]
    InvalidSample {
        timestamp: DateTime<Utc>,
        reason: String,
    },
    #[error("workout has already been started")]
    AlreadyStarted,
    #[error("interval {0} is still open")]
    IncompleteInterval(u32),
    #[error("workout is not completed (state: {0})")]
    SessionNotCompleted(String),
    #[error("workout has already finished")]
    SessionFinished,
    #[error("workout has already been finalized")]
    SessionFinalized,
    #[error("invalid workout configuration: {0}")]
    InvalidConfiguration(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Failures reported by a [`crate::storage::PersistenceGateway`].
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode or decode workout records: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

pub type Result<T, E = WorkoutError> = std::result::Result<T, E>;
