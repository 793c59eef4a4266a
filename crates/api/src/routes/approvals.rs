//! Approver routes: pending queue and decisions.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use expenseflow_core::workflow::{Decision, WorkflowError, WorkflowState};
use expenseflow_db::{ExpenseRepository, WorkflowRepository, repositories::PendingExpense};
use expenseflow_shared::types::ExpenseId;

use super::expenses::ExpenseResponse;
use crate::error::{rejection_response, workflow_error_response};
use crate::{AppState, middleware::AuthUser};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approvals/pending", get(pending_approvals))
        .route("/approvals/{expense_id}", put(decide))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a decision.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// APPROVED or REJECTED.
    pub status: String,
    /// Optional comment recorded in the audit trail.
    pub comment: Option<String>,
}

/// Submitter summary shown to approvers.
#[derive(Debug, Serialize)]
pub struct EmployeeSummary {
    /// Name.
    pub name: String,
    /// Email.
    pub email: String,
}

/// An expense waiting on the caller.
#[derive(Debug, Serialize)]
pub struct PendingExpenseResponse {
    /// Expense data.
    #[serde(flatten)]
    pub expense: ExpenseResponse,
    /// Who submitted it.
    pub employee: Option<EmployeeSummary>,
    /// Amount in the reference currency.
    pub amount_in_company_currency: Decimal,
    /// Step awaiting the caller.
    pub step_number: i32,
}

impl From<PendingExpense> for PendingExpenseResponse {
    fn from(p: PendingExpense) -> Self {
        Self {
            employee: p.employee.map(|u| EmployeeSummary {
                name: u.name,
                email: u.email,
            }),
            amount_in_company_currency: p.normalized_amount,
            step_number: p.step_number,
            expense: ExpenseResponse::from(p.expense),
        }
    }
}

/// Response for an applied decision.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    /// Expense after the decision.
    #[serde(flatten)]
    pub expense: ExpenseResponse,
    /// Workflow state after the decision.
    pub workflow: WorkflowState,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/approvals/pending` - Expenses whose current step belongs to the caller.
async fn pending_approvals(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.pending_for(auth.user_id(), state.rates.as_ref()).await {
        Ok(items) => {
            let items: Vec<PendingExpenseResponse> =
                items.into_iter().map(PendingExpenseResponse::from).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// PUT `/approvals/{expense_id}` - Approve or reject the current step.
async fn decide(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response {
    let Path(expense_id) = match path {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };
    let Some(decision) = Decision::parse(&payload.status) else {
        return workflow_error_response(&WorkflowError::InvalidInput(format!(
            "status must be APPROVED or REJECTED, got '{}'",
            payload.status
        )));
    };

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .decide(
            ExpenseId::from_uuid(expense_id),
            auth.user_id(),
            decision,
            payload.comment,
        )
        .await
    {
        Ok(outcome) => {
            for notification in outcome.notifications {
                state
                    .notifier
                    .dispatch(notification.recipient, notification.message);
            }

            let body = DecisionResponse {
                expense: ExpenseResponse::from(outcome.expense),
                workflow: outcome.state,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}
