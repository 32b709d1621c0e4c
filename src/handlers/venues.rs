//! Venue handlers

use axum::extract::{Path, State};
use axum::Json;

use super::{created, ok, ApiResult, Created};
use crate::entity::venue::{self, VenueFields};
use crate::middleware::Caller;
use crate::state::AppState;

/// GET /api/venues
pub async fn list_venues(State(state): State<AppState>) -> ApiResult<Vec<venue::Model>> {
    ok(state.manager.list_venues(None).await?)
}

/// GET /api/groups/:id/venues
pub async fn list_group_venues(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> ApiResult<Vec<venue::Model>> {
    ok(state.manager.list_venues(Some(group_id)).await?)
}

/// GET /api/venues/:id
pub async fn get_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> ApiResult<venue::Model> {
    ok(state.manager.get_venue(venue_id).await?)
}

/// POST /api/groups/:id/venues
pub async fn create_venue(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
    Json(fields): Json<VenueFields>,
) -> Created<venue::Model> {
    created(state.manager.create_venue(caller, group_id, fields).await?)
}

/// PUT /api/venues/:id
pub async fn update_venue(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(venue_id): Path<i64>,
    Json(fields): Json<VenueFields>,
) -> ApiResult<venue::Model> {
    ok(state.manager.update_venue(caller, venue_id, fields).await?)
}
