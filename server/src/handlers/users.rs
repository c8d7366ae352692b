use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::state::AppState;
use crate::store::UserStore;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
struct RolePayload {
    role: Role,
}

/// Resolves the caller's role. Unknown emails are customers.
pub async fn get_user_role(
    State(state): State<AppState>,
    query: Result<Query<RoleQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::ValidationError("Email is required".to_string()))?;

    let role = state
        .store
        .find_user(email)
        .await?
        .map(|user| user.role)
        .unwrap_or_default();

    tracing::debug!(role = role.as_str(), "role resolved");
    Ok(success(RolePayload { role }, "Role resolved").into_response())
}
