//! Approval rule catalog routes.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use expenseflow_db::{ApprovalRuleRepository, repositories::RuleWithSteps};
use expenseflow_shared::types::{ApprovalRuleId, UserId};

use super::users::{UserResponse, user_to_response};
use crate::error::{app_error_response, rejection_response, workflow_error_response};
use crate::{AppState, middleware::AuthUser};

/// Creates the rule catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rules", get(list_rules).post(create_rule))
        .route("/rules/{rule_id}", delete(delete_rule))
        .route("/rules/{rule_id}/steps", post(add_step))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a rule.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    /// Unique rule name.
    pub name: String,
    /// Inclusive threshold in submitted units.
    #[serde(default)]
    pub min_amount: Decimal,
}

/// Request body for appending a step.
#[derive(Debug, Deserialize)]
pub struct AddStepRequest {
    /// Approver assigned to the new step.
    pub approver_id: Uuid,
}

/// A step with its approver.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    /// Step ID.
    pub id: Uuid,
    /// 1-based position.
    pub step_number: i32,
    /// Assigned approver.
    pub approver: UserResponse,
}

/// A rule with its ordered steps.
#[derive(Debug, Serialize)]
pub struct RuleResponse {
    /// Rule ID.
    pub id: Uuid,
    /// Rule name.
    pub name: String,
    /// Threshold as a decimal string.
    pub min_amount: String,
    /// Steps by ascending `step_number`.
    pub steps: Vec<StepResponse>,
}

impl From<RuleWithSteps> for RuleResponse {
    fn from(value: RuleWithSteps) -> Self {
        Self {
            id: value.rule.id,
            name: value.rule.name,
            min_amount: value.rule.min_amount.normalize().to_string(),
            steps: value
                .steps
                .into_iter()
                .map(|s| StepResponse {
                    id: s.step.id,
                    step_number: s.step.step_number,
                    approver: user_to_response(s.approver),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/rules` - List rules with their steps.
async fn list_rules(State(state): State<AppState>, _auth: AuthUser) -> Response {
    let repo = ApprovalRuleRepository::new((*state.db).clone());

    match repo.list_rules().await {
        Ok(rules) => {
            let items: Vec<RuleResponse> = rules.into_iter().map(RuleResponse::from).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/rules` - Create a rule (admin).
async fn create_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = auth.require_admin() {
        return app_error_response(&e);
    }
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };

    let repo = ApprovalRuleRepository::new((*state.db).clone());
    match repo.create_rule(&payload.name, payload.min_amount).await {
        Ok(rule) => {
            info!(rule_id = %rule.rule.id, created_by = %auth.user_id(), "Approval rule created via API");
            (StatusCode::CREATED, Json(RuleResponse::from(rule))).into_response()
        }
        Err(e) => workflow_error_response(&e),
    }
}

/// POST `/rules/{rule_id}/steps` - Append a step (admin).
async fn add_step(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AddStepRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = auth.require_admin() {
        return app_error_response(&e);
    }
    let Path(rule_id) = match path {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };

    let repo = ApprovalRuleRepository::new((*state.db).clone());
    match repo
        .add_step(
            ApprovalRuleId::from_uuid(rule_id),
            UserId::from_uuid(payload.approver_id),
        )
        .await
    {
        Ok(rule) => (StatusCode::CREATED, Json(RuleResponse::from(rule))).into_response(),
        Err(e) => workflow_error_response(&e),
    }
}

/// DELETE `/rules/{rule_id}` - Delete a rule and its steps (admin).
async fn delete_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    if let Err(e) = auth.require_admin() {
        return app_error_response(&e);
    }
    let Path(rule_id) = match path {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };

    let repo = ApprovalRuleRepository::new((*state.db).clone());
    match repo.delete_rule(ApprovalRuleId::from_uuid(rule_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => workflow_error_response(&e),
    }
}
