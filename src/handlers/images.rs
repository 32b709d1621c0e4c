//! Image handlers
//!
//! Images are created either under their owner's route or through
//! `POST /api/images` with explicit owner references.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::{created, ok, ApiResult, Created};
use crate::entity::image::{self, ImageOwner, NewImage};
use crate::middleware::Caller;
use crate::state::AppState;

/// Body of the nested image routes; the owner comes from the path
#[derive(Debug, Deserialize)]
pub struct ImageBody {
    pub url: String,
    #[serde(default)]
    pub preview: bool,
}

async fn attach(state: AppState, caller: Caller, owner: ImageOwner, body: ImageBody) -> Created<image::Model> {
    let new = NewImage::for_owner(body.url, body.preview, owner);
    created(state.manager.create_image(caller.0, new).await?)
}

/// POST /api/images
pub async fn create_image(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(new): Json<NewImage>,
) -> Created<image::Model> {
    created(state.manager.create_image(caller, new).await?)
}

/// POST /api/groups/:id/images
pub async fn create_group_image(
    State(state): State<AppState>,
    caller: Caller,
    Path(group_id): Path<i64>,
    Json(body): Json<ImageBody>,
) -> Created<image::Model> {
    attach(state, caller, ImageOwner::Group(group_id), body).await
}

/// POST /api/events/:id/images
pub async fn create_event_image(
    State(state): State<AppState>,
    caller: Caller,
    Path(event_id): Path<i64>,
    Json(body): Json<ImageBody>,
) -> Created<image::Model> {
    attach(state, caller, ImageOwner::Event(event_id), body).await
}

/// POST /api/venues/:id/images
pub async fn create_venue_image(
    State(state): State<AppState>,
    caller: Caller,
    Path(venue_id): Path<i64>,
    Json(body): Json<ImageBody>,
) -> Created<image::Model> {
    attach(state, caller, ImageOwner::Venue(venue_id), body).await
}

/// GET /api/groups/:id/images
pub async fn list_group_images(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> ApiResult<Vec<image::Model>> {
    ok(state.manager.list_images(ImageOwner::Group(group_id)).await?)
}

/// GET /api/events/:id/images
pub async fn list_event_images(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<Vec<image::Model>> {
    ok(state.manager.list_images(ImageOwner::Event(event_id)).await?)
}

/// GET /api/venues/:id/images
pub async fn list_venue_images(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> ApiResult<Vec<image::Model>> {
    ok(state.manager.list_images(ImageOwner::Venue(venue_id)).await?)
}
