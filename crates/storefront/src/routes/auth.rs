//! Authentication route handlers.
//!
//! Email/password accounts live in the backend's auth provider; a successful
//! login stores the user's identity in the session cookie.

use axum::{Json, extract::State, http::StatusCode};
use marketplace_core::UserRole;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request. No `Debug`, it carries a password.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Login request.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password reset request.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and log it in.
///
/// POST /auth/register
///
/// # Errors
///
/// Returns `AppError::Auth` for invalid input or an existing email.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let auth = AuthService::new(state.backend());
    let user = auth
        .register(
            &request.email,
            &request.password,
            &request.display_name,
            request.role,
        )
        .await?;

    let current = CurrentUser {
        id: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
///
/// POST /auth/login
///
/// # Errors
///
/// Returns `AppError::Auth` for wrong credentials.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentUser>> {
    let auth = AuthService::new(state.backend());
    let current = auth
        .login(&request.email, &request.password)
        .await?;

    set_current_user(&session, &current)
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    info!(user_id = %current.id, "User logged in");

    Ok(Json(current))
}

/// End the session. Succeeds when nobody is logged in.
///
/// POST /auth/logout
///
/// # Errors
///
/// Returns `AppError::Internal` if the session store fails.
pub async fn logout(
    session: Session,
    OptionalAuth(current): OptionalAuth,
) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();
    if let Some(user) = current {
        info!(user_id = %user.id, "User logged out");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Send a password reset email.
///
/// POST /auth/password-reset
///
/// Responds the same way whether or not the email has an account.
///
/// # Errors
///
/// Returns `AppError::Auth` for a malformed email.
pub async fn password_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    AuthService::new(state.backend())
        .send_password_reset(&request.email)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "If the address has an account, a reset email is on its way" })),
    ))
}
