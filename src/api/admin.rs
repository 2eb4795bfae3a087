use axum::{
    Json,
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::session_user;
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::services::UserEdit;

// ============================================================================
// Middleware
// ============================================================================

/// Gate for privileged routes. The session's admin flag only drives UI
/// navigation; authorization here re-checks `is_admin` against the store
/// for the session's username on every call.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let record = session_user(&session).await?;

    let user = state
        .store()
        .get_user_by_username(&record.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to verify admin: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    if !user.is_admin {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Absent or empty = keep the current password.
    #[serde(default)]
    pub password: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /admin/users
/// Full user list in insertion order
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.admin.list_users().await?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// PUT /admin/users/{id}
/// Edit username/email/admin flag, optionally replacing the password
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    // An empty password field from the form means "leave unchanged".
    let password = payload.password.filter(|p| !p.is_empty());

    let edit = UserEdit {
        username: payload.username,
        email: payload.email,
        is_admin: payload.is_admin,
        password,
    };

    let user = state.admin.update_user(id, edit).await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /admin/users/{id}
/// Remove a user; deleting a missing id is a success no-op
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state.admin.delete_user(id).await?;

    let message = if deleted {
        format!("User {id} deleted")
    } else {
        format!("User {id} did not exist")
    };

    Ok(Json(ApiResponse::success(MessageResponse { message })))
}
