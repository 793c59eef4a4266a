//! User management routes.
//!
//! Listing is open to every caller; mutations are admin-only.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use uuid::Uuid;

use expenseflow_core::user::Role;
use expenseflow_db::{
    UserRepository,
    entities::users,
    repositories::{CreateUserInput, UpdateUserInput},
};
use expenseflow_shared::AppError;
use expenseflow_shared::types::UserId;

use crate::error::{app_error_response, rejection_response, user_error_response};
use crate::{AppState, middleware::AuthUser};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{user_id}", patch(update_user).delete(delete_user))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: String,
    /// Unique email.
    pub email: String,
    /// EMPLOYEE or MANAGER.
    pub role: String,
    /// Optional manager.
    pub manager_id: Option<Uuid>,
}

/// Request body for updating a user.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New role.
    pub role: Option<String>,
    /// New manager; an explicit `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub manager_id: Option<Option<Uuid>>,
}

/// Distinguishes an absent field from an explicit `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

/// Response for a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Role.
    pub role: String,
    /// Manager, if any.
    pub manager_id: Option<Uuid>,
}

pub(crate) fn user_to_response(user: users::Model) -> UserResponse {
    UserResponse {
        id: user.id,
        role: Role::from(user.role).as_str().to_string(),
        name: user.name,
        email: user.email,
        manager_id: user.manager_id,
    }
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    Role::parse(raw).ok_or_else(|| AppError::Validation(format!("invalid role '{raw}'")))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/users` - List users.
async fn list_users(State(state): State<AppState>, _auth: AuthUser) -> Response {
    let repo = UserRepository::new((*state.db).clone());

    match repo.list_users().await {
        Ok(users) => {
            let items: Vec<UserResponse> = users.into_iter().map(user_to_response).collect();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => user_error_response(&e),
    }
}

/// POST `/users` - Create a user (admin).
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = auth.require_admin() {
        return app_error_response(&e);
    }
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };
    let role = match parse_role(&payload.role) {
        Ok(r) => r,
        Err(e) => return app_error_response(&e),
    };

    let repo = UserRepository::new((*state.db).clone());
    let input = CreateUserInput {
        name: payload.name,
        email: payload.email,
        role,
        manager_id: payload.manager_id.map(UserId::from_uuid),
    };

    match repo.create_user(input).await {
        Ok(user) => {
            info!(user_id = %user.id, created_by = %auth.user_id(), "User created via API");
            (StatusCode::CREATED, Json(user_to_response(user))).into_response()
        }
        Err(e) => user_error_response(&e),
    }
}

/// PATCH `/users/{user_id}` - Update role and/or manager (admin).
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = auth.require_admin() {
        return app_error_response(&e);
    }
    let Path(user_id) = match path {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };
    let role = match payload.role.as_deref().map(parse_role).transpose() {
        Ok(r) => r,
        Err(e) => return app_error_response(&e),
    };

    let repo = UserRepository::new((*state.db).clone());
    let input = UpdateUserInput {
        role,
        manager_id: payload
            .manager_id
            .map(|manager| manager.map(UserId::from_uuid)),
    };

    match repo.update_user(UserId::from_uuid(user_id), input).await {
        Ok(user) => (StatusCode::OK, Json(user_to_response(user))).into_response(),
        Err(e) => user_error_response(&e),
    }
}

/// DELETE `/users/{user_id}` - Delete a user (admin).
async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    if let Err(e) = auth.require_admin() {
        return app_error_response(&e);
    }
    let Path(user_id) = match path {
        Ok(p) => p,
        Err(e) => return rejection_response(e),
    };

    let repo = UserRepository::new((*state.db).clone());
    match repo.delete_user(UserId::from_uuid(user_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => user_error_response(&e),
    }
}
