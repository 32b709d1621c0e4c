//! Credential handlers
//!
//! Sign up, log in, log out and current user. Passwords are hashed with bcrypt;
//! the session stores only the user id.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use tower_sessions::Session;

use super::{created, ok, ApiResult, Created};
use crate::entity::user::{NewUser, UserResponse};
use crate::error::AppError;
use crate::middleware::{CurrentUser, SESSION_USER_KEY};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Sign up request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().len() < 4 {
            return Err(AppError::Validation(
                "Username must be at least 4 characters".to_string(),
            ));
        }
        if self.username.contains('@') {
            return Err(AppError::Validation("Username cannot be an email".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation("Invalid email".to_string()));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::Validation(
                "First and last name are required".to_string(),
            ));
        }
        if self.password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be 6 characters or more".to_string(),
            ));
        }
        Ok(())
    }
}

/// Login request body; `credential` is a username or an email
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub credential: String,
    pub password: String,
}

fn session_err(e: tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {}", e))
}

/// POST /api/users
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SignupRequest>,
) -> Created<UserResponse> {
    req.validate()?;

    let hashed_password = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

    let user = state
        .store()
        .insert_user(NewUser {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            hashed_password,
        })
        .await?;

    session.cycle_id().await.map_err(session_err)?;
    session.insert(SESSION_USER_KEY, user.id).await.map_err(session_err)?;

    tracing::info!("User signed up: {}", user.username);
    created(UserResponse::from(user))
}

/// POST /api/session
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> ApiResult<UserResponse> {
    if req.credential.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Credential and password are required".to_string(),
        ));
    }

    let Some(user) = state.store().find_user_by_credential(&req.credential).await? else {
        tracing::warn!("Login failed: user not found - {}", req.credential);
        return Err(AppError::Unauthenticated);
    };

    let password_valid = bcrypt::verify(&req.password, &user.hashed_password).unwrap_or(false);
    if !password_valid {
        tracing::warn!("Login failed: wrong password - {}", req.credential);
        return Err(AppError::Unauthenticated);
    }

    session.cycle_id().await.map_err(session_err)?;
    session.insert(SESSION_USER_KEY, user.id).await.map_err(session_err)?;

    tracing::info!("User logged in: {}", user.username);
    ok(UserResponse::from(user))
}

/// DELETE /api/session
pub async fn logout(
    session: Session,
    current_user: Option<Extension<CurrentUser>>,
) -> ApiResult<()> {
    session.flush().await.map_err(session_err)?;
    if let Some(Extension(user)) = current_user {
        tracing::info!("User logged out: {}", user.username);
    }
    Ok(Json(ApiResponse::success_msg("success")))
}

/// GET /api/session
///
/// `data` is null when nobody is logged in.
pub async fn current_user(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
) -> ApiResult<Option<UserResponse>> {
    let user = match current_user {
        Some(Extension(current)) => state.store().find_user(current.id).await?,
        None => None,
    };
    ok(user.map(UserResponse::from))
}
