//! Boundary between the client-side controllers and the remote API.

use thiserror::Error;

/// Failure reported by a remote gateway call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The row changed since it was read.
    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success answer from the server.
    #[error("Rejected with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The call never produced a usable answer.
    #[error("Remote error: {0}")]
    Remote(String),
}

/// Blocking yes/no dialog shown before destructive actions.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of a confirmation-gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Cancelled,
}
