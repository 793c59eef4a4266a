//! JSON error responses.
//!
//! Every failure is rendered as `{ "error": <code>, "message": <text> }` with
//! the status code of its variant.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use expenseflow_core::workflow::WorkflowError;
use expenseflow_db::UserError;
use expenseflow_shared::AppError;

fn json_error(status: u16, code: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": code,
            "message": message,
        })),
    )
        .into_response()
}

/// Renders a workflow or rule-catalog failure.
pub fn workflow_error_response(e: &WorkflowError) -> Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Workflow operation failed");
    } else {
        warn!(error = %e, code = e.error_code(), "Workflow request refused");
    }
    json_error(e.status_code(), e.error_code(), &e.to_string())
}

/// Renders a user-management failure.
pub fn user_error_response(e: &UserError) -> Response {
    if e.status_code() >= 500 {
        error!(error = %e, "User operation failed");
    } else {
        warn!(error = %e, code = e.error_code(), "User request refused");
    }
    json_error(e.status_code(), e.error_code(), &e.to_string())
}

/// Renders a boundary failure (identity, admin gate, malformed request).
pub fn app_error_response(e: &AppError) -> Response {
    if e.status_code() >= 500 {
        error!(error = %e, "Request failed");
    } else {
        warn!(error = %e, code = e.error_code(), "Request refused");
    }
    json_error(e.status_code(), e.error_code(), &e.to_string())
}

/// Renders a rejected extractor (malformed JSON body or path) as a validation error.
pub fn rejection_response(rejection: impl std::fmt::Display) -> Response {
    app_error_response(&AppError::Validation(rejection.to_string()))
}
