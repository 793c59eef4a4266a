//! Application configuration management.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Reference currency and conversion table.
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Notification delivery configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite:...`).
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Creates a configuration for the given URL with default pool sizes.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }

    /// Returns true if the URL points at a process-local in-memory SQLite database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("sqlite") && self.url.contains(":memory:")
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Currency normalization configuration.
///
/// `rates` maps a currency code to its multiplier against `reference`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Reference (company) currency code.
    #[serde(default = "default_reference_currency")]
    pub reference: String,
    /// Multipliers into the reference currency, keyed by currency code.
    #[serde(default = "default_rates")]
    pub rates: HashMap<String, Decimal>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            reference: default_reference_currency(),
            rates: default_rates(),
        }
    }
}

fn default_reference_currency() -> String {
    "INR".to_string()
}

fn default_rates() -> HashMap<String, Decimal> {
    HashMap::from([
        ("USD".to_string(), Decimal::new(8350, 2)),
        ("EUR".to_string(), Decimal::new(9025, 2)),
    ])
}

/// Which sink the notification worker delivers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Append to a local log file.
    #[default]
    File,
    /// Send through an SMTP relay.
    Smtp,
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Recipient that is told about every new submission.
    #[serde(default = "default_admin_recipient")]
    pub admin_recipient: String,
    /// Delivery sink.
    #[serde(default)]
    pub sink: SinkKind,
    /// Path of the log file used by the file sink.
    #[serde(default = "default_log_path")]
    pub log_path: String,
    /// SMTP settings, required when `sink = "smtp"`.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            admin_recipient: default_admin_recipient(),
            sink: SinkKind::default(),
            log_path: default_log_path(),
            smtp: None,
        }
    }
}

fn default_admin_recipient() -> String {
    "admin@company.com".to_string()
}

fn default_log_path() -> String {
    "notifications.log".to_string()
}

/// SMTP relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: String,
    /// SMTP password.
    #[serde(default)]
    pub password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_name() -> String {
    "ExpenseFlow".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("EXPENSEFLOW").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("EXPENSEFLOW__DATABASE__URL", Some("sqlite::memory:")),
                ("EXPENSEFLOW__SERVER__PORT", Some("9090")),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 9090);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.currency.reference, "INR");
                assert_eq!(config.notifications.sink, SinkKind::File);
            },
        );
    }

    #[test]
    fn test_load_without_database_url_fails() {
        temp_env::with_vars(
            [
                ("EXPENSEFLOW__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_default_rates() {
        let currency = CurrencyConfig::default();
        assert_eq!(currency.rates.get("USD"), Some(&Decimal::new(8350, 2)));
        assert_eq!(currency.rates.get("EUR"), Some(&Decimal::new(9025, 2)));
        assert!(!currency.rates.contains_key("INR"));
    }

    #[test]
    fn test_in_memory_detection() {
        assert!(DatabaseConfig::with_url("sqlite::memory:").is_in_memory());
        assert!(!DatabaseConfig::with_url("sqlite://data.db?mode=rwc").is_in_memory());
        assert!(!DatabaseConfig::with_url("postgres://localhost/expenseflow").is_in_memory());
    }
}
