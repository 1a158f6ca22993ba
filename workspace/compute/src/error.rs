use thiserror::Error;
use tracing::error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The daily frame did not have the expected columns
    #[error("DataFrame error: {0}")]
    DataFrame(String),

    /// Any other polars failure while building a series
    #[error("Series error: {0}")]
    Series(String),

    /// Error from window construction
    #[error("Window error: {0}")]
    Window(#[from] common::WindowError),

    /// Error from date operations
    #[error("Date error: {0}")]
    Date(String),

    /// Error from decimal operations
    #[error("Decimal error: {0}")]
    Decimal(String),

    /// Error from a client or campaign lookup
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<polars::error::PolarsError> for ComputeError {
    fn from(error: polars::error::PolarsError) -> Self {
        use polars::error::PolarsError;

        let err = match error {
            PolarsError::ColumnNotFound(_)
            | PolarsError::SchemaMismatch(_)
            | PolarsError::ShapeMismatch(_) => {
                ComputeError::DataFrame(format!("Daily frame has unexpected shape: {}", error))
            }
            _ => ComputeError::Series(error.to_string()),
        };
        error!(?err, "Series computation failed");
        err
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
