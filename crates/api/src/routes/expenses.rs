//! Expense submission and read routes.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use expenseflow_core::workflow::{ExpenseStatus, LogAction, WorkflowState};
use expenseflow_db::{
    ExpenseRepository, WorkflowRepository,
    entities::{expense_logs, expenses},
    repositories::SubmitExpenseInput,
};
use expenseflow_shared::types::ExpenseId;

use crate::error::{rejection_response, workflow_error_response};
use crate::{AppState, middleware::AuthUser};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(submit_expense))
        .route("/expenses/mine", get(my_expenses))
        .route("/expenses/{expense_id}/history", get(expense_history))
}

// ============================================================================
// Request/Response Types
// ============================================================================

fn default_currency() -> String {
    "USD".to_string()
}

/// Request body for submitting an expense.
#[derive(Debug, Deserialize)]
pub struct SubmitExpenseRequest {
    /// Positive amount.
    pub amount: Decimal,
    /// ISO currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Category label.
    pub category: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Date the expense was incurred (RFC 3339).
    pub date: DateTime<FixedOffset>,
}

/// An expense as seen by its owner.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Expense ID.
    pub id: Uuid,
    /// Owner.
    pub employee_id: Uuid,
    /// Submitted amount.
    pub amount: Decimal,
    /// Submitted currency.
    pub currency: String,
    /// Category label.
    pub category: String,
    /// Description.
    pub description: String,
    /// Date the expense was incurred.
    pub date: DateTime<FixedOffset>,
    /// PENDING, APPROVED or REJECTED.
    pub status: &'static str,
    /// Submission time.
    pub created_at: DateTime<FixedOffset>,
}

impl From<expenses::Model> for ExpenseResponse {
    fn from(e: expenses::Model) -> Self {
        Self {
            id: e.id,
            employee_id: e.employee_id,
            amount: e.amount,
            currency: e.currency,
            category: e.category,
            description: e.description,
            date: e.expense_date,
            status: ExpenseStatus::from(e.status).as_str(),
            created_at: e.created_at,
        }
    }
}

/// Response for a submission.
#[derive(Debug, Serialize)]
pub struct SubmittedExpenseResponse {
    /// Stored expense.
    #[serde(flatten)]
    pub expense: ExpenseResponse,
    /// Routing decision taken at submission.
    pub workflow: WorkflowState,
}

/// One audit entry.
#[derive(Debug, Serialize)]
pub struct HistoryEntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Actor name at the time of the action.
    pub user_name: String,
    /// SUBMITTED, APPROVED, REJECTED or AUTO-APPROVED.
    pub action: &'static str,
    /// Optional comment.
    pub comment: Option<String>,
    /// When the action was recorded.
    pub timestamp: DateTime<FixedOffset>,
}

impl From<expense_logs::Model> for HistoryEntryResponse {
    fn from(log: expense_logs::Model) -> Self {
        Self {
            id: log.id,
            user_name: log.actor_name,
            action: LogAction::from(log.action).as_str(),
            comment: log.comment,
            timestamp: log.logged_at,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/expenses` - Submit an expense as the caller.
async fn submit_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<SubmitExpenseRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    let input = SubmitExpenseInput {
        amount: payload.amount,
        currency: payload.currency,
        category: payload.category,
        description: payload.description,
        expense_date: payload.date,
    };

    match repo.submit(auth.user_id(), input).await {
        Ok(outcome) => {
            state.notifier.dispatch(
                state.admin_recipient.clone(),
                format!("New expense #{} submitted.", outcome.expense.id),
            );
            for notification in outcome.notifications {
                state
                    .notifier
                    .dispatch(notification.recipient, notification.message);
            }

            let body = SubmittedExpenseResponse {
                expense: ExpenseResponse::from(outcome.expense),
                workflow: outcome.state,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/expenses/mine` - The caller's expenses, most recent first.
async fn my_expenses(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.expenses_of(auth.user_id()).await {
        Ok(items) => {
            let items: Vec<ExpenseResponse> =
                items.into_iter().map(ExpenseResponse::from).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// GET `/expenses/{expense_id}/history` - Audit trail, oldest first.
async fn expense_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let Path(expense_id) = match path {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };

    let repo = ExpenseRepository::new((*state.db).clone());
    match repo.history_for(ExpenseId::from_uuid(expense_id)).await {
        Ok(logs) => {
            let items: Vec<HistoryEntryResponse> =
                logs.into_iter().map(HistoryEntryResponse::from).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}
