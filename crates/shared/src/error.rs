//! Boundary error type.
//!
//! Raised before a request reaches the workflow: caller identity, the admin
//! gate and malformed request bodies. Workflow failures carry their own
//! taxonomy in `expenseflow-core`; user-management failures live next to the
//! user repository.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Errors raised at the HTTP boundary or during start-up.
#[derive(Debug, Error)]
pub enum AppError {
    /// `X-User-ID` missing, malformed or unknown.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller lacks the role required for the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Request body or path could not be parsed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage failure outside a workflow operation.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Validation(_) => 400,
            Self::Database(_) | Self::Config(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}
