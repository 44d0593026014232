//! Typed errors for the collector library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Nothing in here is raised by [`Collector::collect`](crate::Collector::collect):
//! malformed input is downgraded to an empty step outcome inside the pipeline.
//! These errors come from the collaborators (stores, configuration).

use thiserror::Error;

/// Errors that can occur outside the extraction hot path.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// No tokio runtime available to run persistence handoffs on
    #[error("no async runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

impl CollectorError {
    /// Wrap any displayable storage failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string().into())
    }
}

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, CollectorError>;
