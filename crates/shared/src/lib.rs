//! Shared types, errors, and configuration for ExpenseFlow.
//!
//! This crate provides common pieces used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management
//! - The notification collaborator (queue, worker, sinks)

pub mod config;
pub mod error;
pub mod notification;
pub mod types;

pub use config::{
    AppConfig, CurrencyConfig, DatabaseConfig, NotificationConfig, ServerConfig, SinkKind,
    SmtpConfig,
};
pub use error::{AppError, AppResult};
pub use notification::{
    FileSink, Notification, NotificationDispatcher, NotificationError, NotificationSink, SmtpSink,
};
