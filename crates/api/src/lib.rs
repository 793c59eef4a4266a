//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Caller identity middleware (`X-User-ID`)
//! - JSON error mapping for the workflow and user taxonomies

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use expenseflow_core::currency::ExchangeRateProvider;
use expenseflow_shared::NotificationDispatcher;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Queue onto the notification worker.
    pub notifier: NotificationDispatcher,
    /// Exchange rates used to normalize pending amounts.
    pub rates: Arc<dyn ExchangeRateProvider>,
    /// Recipient told about every new submission.
    pub admin_recipient: String,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
