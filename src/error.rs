//! Crate-Level Error Types
//!
//! Boundary errors (API, config) each have their own enum; this is the
//! umbrella type the library surface returns.

use thiserror::Error;

/// Top-level error for the truechart engine
#[derive(Debug, Error)]
pub enum TruechartError {
    /// Backend API call failed
    #[error(transparent)]
    Api(#[from] crate::api::ApiError),

    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Config(String),

    /// A local precondition was not met (no network call was made)
    #[error("{0}")]
    Precondition(String),

    /// I/O failure reading user-supplied files
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used across the library surface
pub type Result<T> = std::result::Result<T, TruechartError>;
