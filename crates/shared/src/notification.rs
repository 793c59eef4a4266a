//! Notification collaborator.
//!
//! Workflow operations hand a [`Notification`] to the [`NotificationDispatcher`]
//! after their transaction commits. Delivery happens on a separate worker task,
//! so a slow or failing sink never delays or fails the workflow operation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SmtpConfig;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Failed to build the outgoing message.
    #[error("Failed to build notification: {0}")]
    BuildError(String),
    /// Failed to hand the message to the transport.
    #[error("Failed to deliver notification: {0}")]
    SendError(String),
    /// Invalid recipient or sender address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    /// Failed to write to the notification log.
    #[error("Notification log error: {0}")]
    Io(#[from] std::io::Error),
}

/// A message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address (email).
    pub recipient: String,
    /// Plain-text message body.
    pub message: String,
}

impl Notification {
    /// Creates a new notification.
    #[must_use]
    pub fn new(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
        }
    }
}

/// Delivery backend used by the notification worker.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Appends one line per notification to a local log file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl NotificationSink for FileSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let line = format!(
            "Notification for {}: {}\n",
            notification.recipient, notification.message
        );
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Sends notifications as plain-text email through an SMTP relay.
#[derive(Clone)]
pub struct SmtpSink {
    config: SmtpConfig,
}

impl SmtpSink {
    /// Creates a new SMTP sink.
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| NotificationError::SendError(e.to_string()))?
                .port(self.config.port)
                .credentials(creds)
                .build(),
        )
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotificationError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| NotificationError::InvalidAddress(format!("{e}")))?,
            )
            .to(notification
                .recipient
                .parse()
                .map_err(|e| NotificationError::InvalidAddress(format!("{e}")))?)
            .subject("Expense approval update")
            .header(ContentType::TEXT_PLAIN)
            .body(notification.message.clone())
            .map_err(|e| NotificationError::BuildError(e.to_string()))
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let email = self.build_message(notification)?;
        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| NotificationError::SendError(e.to_string()))?;
        Ok(())
    }
}

/// Fire-and-forget handle onto the notification queue.
///
/// Cloning is cheap; every clone feeds the same worker. The worker exits once
/// every dispatcher has been dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Spawns the delivery worker on the current Tokio runtime.
    #[must_use]
    pub fn spawn(sink: Arc<dyn NotificationSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                match sink.deliver(&notification).await {
                    Ok(()) => debug!(recipient = %notification.recipient, "Notification delivered"),
                    Err(e) => warn!(
                        recipient = %notification.recipient,
                        error = %e,
                        "Notification delivery failed"
                    ),
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Queues a notification. Never blocks and never fails the caller.
    pub fn dispatch(&self, recipient: impl Into<String>, message: impl Into<String>) {
        let notification = Notification::new(recipient, message);
        if let Err(e) = self.tx.send(notification) {
            warn!(recipient = %e.0.recipient, "Notification worker is gone, dropping message");
        }
    }
}
