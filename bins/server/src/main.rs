//! ExpenseFlow API Server
//!
//! Main entry point for the expense approval service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expenseflow_api::{AppState, create_router};
use expenseflow_core::currency::StaticRateTable;
use expenseflow_db::{connect, migrate};
use expenseflow_shared::{
    AppConfig, FileSink, NotificationDispatcher, NotificationSink, SinkKind, SmtpSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expenseflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;
    migrate(&db).await.context("Failed to apply migrations")?;
    info!("Connected to database");

    let sink: Arc<dyn NotificationSink> = match config.notifications.sink {
        SinkKind::File => {
            info!(path = %config.notifications.log_path, "Notifications go to file");
            Arc::new(FileSink::new(&config.notifications.log_path))
        }
        SinkKind::Smtp => {
            let smtp = config
                .notifications
                .smtp
                .clone()
                .context("notifications.smtp must be set when sink = \"smtp\"")?;
            info!(smtp_host = %smtp.host, smtp_port = smtp.port, "Notifications go to SMTP");
            Arc::new(SmtpSink::new(smtp))
        }
    };
    let (notifier, _worker) = NotificationDispatcher::spawn(sink);

    let rates = StaticRateTable::new(
        config.currency.reference.clone(),
        config.currency.rates.clone(),
    );
    info!(
        reference = %config.currency.reference,
        rates = config.currency.rates.len(),
        "Exchange rates loaded"
    );

    let state = AppState {
        db: Arc::new(db),
        notifier,
        rates: Arc::new(rates),
        admin_recipient: config.notifications.admin_recipient.clone(),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
