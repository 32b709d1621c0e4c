use axum::{
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::handlers::{attendees, events, groups, images, members, session, venues};
use crate::middleware::identity_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Session store (in-memory)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.session.secure)
        .with_http_only(true);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Session routes
        .route("/users", post(session::signup))
        .route(
            "/session",
            get(session::current_user)
                .post(session::login)
                .delete(session::logout),
        )
        // Group routes
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/current", get(groups::current_groups))
        .route(
            "/groups/:id",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/groups/:id/members",
            get(members::list_members)
                .post(members::request_membership)
                .put(members::update_membership)
                .delete(members::delete_membership),
        )
        .route(
            "/groups/:id/venues",
            get(venues::list_group_venues).post(venues::create_venue),
        )
        .route(
            "/groups/:id/events",
            get(events::list_group_events).post(events::create_event),
        )
        .route(
            "/groups/:id/images",
            get(images::list_group_images).post(images::create_group_image),
        )
        // Venue routes
        .route("/venues", get(venues::list_venues))
        .route("/venues/:id", get(venues::get_venue).put(venues::update_venue))
        .route(
            "/venues/:id/images",
            get(images::list_venue_images).post(images::create_venue_image),
        )
        // Event routes
        .route("/events", get(events::list_events))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/attendees",
            get(attendees::list_attendees)
                .post(attendees::request_attendance)
                .put(attendees::update_attendance)
                .delete(attendees::delete_attendance),
        )
        .route(
            "/events/:id/images",
            get(images::list_event_images).post(images::create_event_image),
        )
        // Image routes
        .route("/images", post(images::create_image));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), identity_layer))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Not Found")))
}
