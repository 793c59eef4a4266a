//! Caller identity middleware for protected routes.
//!
//! The caller is identified by the `X-User-ID` header, which must hold the
//! UUID of a stored user. The resolved user is placed in the request
//! extensions for the [`AuthUser`] extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::error;

use expenseflow_db::{UserRepository, entities::sea_orm_active_enums::UserRole, entities::users};
use expenseflow_shared::AppError;
use expenseflow_shared::types::UserId;

use crate::AppState;
use crate::error::app_error_response;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that resolves `X-User-ID` to a stored user.
///
/// Missing, malformed or unknown ids are rejected with 401.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok());

    let Some(raw) = header else {
        return app_error_response(&AppError::Unauthorized(
            "X-User-ID header is required".to_string(),
        ));
    };

    let Ok(user_id) = raw.trim().parse::<UserId>() else {
        return app_error_response(&AppError::Unauthorized(
            "X-User-ID header must be a UUID".to_string(),
        ));
    };

    let repo = UserRepository::new((*state.db).clone());
    match repo.find_by_id(user_id).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser(user));
            next.run(request).await
        }
        Ok(None) => app_error_response(&AppError::Unauthorized(format!(
            "unknown user {user_id}"
        ))),
        Err(e) => {
            error!(error = %e, "Failed to resolve caller identity");
            app_error_response(&AppError::Database(e.to_string()))
        }
    }
}

/// Extractor for the authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub users::Model);

impl AuthUser {
    /// Returns the caller's user ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.0.id)
    }

    /// Returns true if the caller is the ADMIN.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }

    /// Rejects non-admin callers.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` unless the caller is the ADMIN.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            app_error_response(&AppError::Unauthorized(
                "Authentication required".to_string(),
            ))
        })
    }
}
