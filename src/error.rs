use std::convert::Infallible;

use thiserror::Error;

/// Errors surfaced by the presence tracker.
#[derive(Error, Debug)]
pub enum PresenceError {
    #[error("Invalid status '{0}', expected 'online' or 'away'")]
    InvalidStatus(String),

    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("Polling requires a running tokio runtime")]
    NoRuntime,
}

// Lets `Status` itself go through the same `TryInto<Status>` path as strings.
impl From<Infallible> for PresenceError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

pub type Result<T, E = PresenceError> = std::result::Result<T, E>;
