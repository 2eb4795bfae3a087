use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::services::AuthError;

/// Session key holding the logged-in user record.
const SESSION_USER_KEY: &str = "user";

/// The client-visible login state: who is logged in and whether the admin
/// UI branches should be reachable. Privileged handlers do NOT trust the
/// `is_admin` flag here; they re-check the store (see `admin::require_admin`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub is_admin: bool,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email; matched exactly against either column.
    pub identifier: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub is_admin: bool,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gate for routes that require a logged-in user. The session record is the
/// only credential checked here; admin routes layer `require_admin` on top.
pub async fn login_required(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user)) = session.get::<SessionUser>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user", user.username.as_str());
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Please log in to access this page");
    Ok(response.into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create a new non-admin account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = state
        .auth
        .register(
            &payload.username,
            &payload.email,
            &payload.password,
            &payload.confirm_password,
        )
        .await?;

    tracing::info!("Registered new user: {}", user.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Registration successful".to_string(),
    })))
}

/// POST /auth/login
/// Authenticate with username or email plus password, sets the session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let user = state.auth.login(&payload.identifier, &payload.password).await?;

    let record = SessionUser {
        username: user.username.clone(),
        is_admin: user.is_admin,
    };

    if let Err(e) = session.insert(SESSION_USER_KEY, &record).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(ApiResponse::success(SessionResponse {
        username: user.username,
        is_admin: user.is_admin,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Result<impl IntoResponse, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear session: {e}")))?;

    Ok((StatusCode::OK, "Logged out"))
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let record = session_user(&session).await?;

    // A session may outlive its account (admin deletion); treat that as
    // a stale login, not a 404.
    let user = state
        .auth
        .get_user(&record.username)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => {
                ApiError::Unauthorized("Not authenticated".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

// ============================================================================
// Helpers
// ============================================================================

/// Get the session record, returns error if not authenticated
pub async fn session_user(session: &Session) -> Result<SessionUser, ApiError> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
