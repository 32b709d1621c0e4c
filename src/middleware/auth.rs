//! Session identity middleware
//!
//! Resolves the session's user id to a [`CurrentUser`] extension. Requests
//! without a valid session pass through anonymously; the lifecycle manager
//! decides what an anonymous caller may do.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tower_sessions::Session;

use crate::entity::UserId;
use crate::state::AppState;

/// Session key for storing the user id
pub const SESSION_USER_KEY: &str = "user_id";

/// Extension to store current user in request
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
}

/// Identity middleware, never rejects
pub async fn identity_layer(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user_id: Option<UserId> = match session.get(SESSION_USER_KEY).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Failed to read session: {}", e);
            None
        }
    };

    if let Some(user_id) = user_id {
        match state.store().find_user(user_id).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(CurrentUser {
                    id: user.id,
                    username: user.username,
                });
            }
            Ok(None) => {
                tracing::warn!("Session references missing user: {}", user_id);
            }
            Err(e) => {
                tracing::error!("Store error during identity lookup: {}", e);
            }
        }
    }

    next.run(request).await
}

/// The authenticated caller's id, if any
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller(pub Option<UserId>);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<CurrentUser>().map(|u| u.id)))
    }
}
