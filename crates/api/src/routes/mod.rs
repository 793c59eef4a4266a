//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::identity_middleware};

pub mod approvals;
pub mod expenses;
pub mod health;
pub mod rules;
pub mod users;

/// Creates the API router; everything except health requires a caller identity.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(rules::routes())
        .merge(expenses::routes())
        .merge(approvals::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
