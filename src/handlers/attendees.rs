//! Event attendance handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::{created, deleted, ok, ApiResult, Created};
use crate::entity::event_attendance::{self, AttendanceStatus};
use crate::entity::UserId;
use crate::lifecycle::AttendeeView;
use crate::middleware::Caller;
use crate::state::AppState;

/// Body of `PUT /api/events/:id/attendees`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceRequest {
    pub user_id: UserId,
    pub status: AttendanceStatus,
}

/// Body of `DELETE /api/events/:id/attendees`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAttendanceRequest {
    pub user_id: UserId,
}

/// GET /api/events/:id/attendees
pub async fn list_attendees(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(event_id): Path<i64>,
) -> ApiResult<Vec<AttendeeView>> {
    ok(state.manager.list_attendees(caller, event_id).await?)
}

/// POST /api/events/:id/attendees
pub async fn request_attendance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(event_id): Path<i64>,
) -> Created<event_attendance::Model> {
    created(state.manager.request_attendance(caller, event_id).await?)
}

/// PUT /api/events/:id/attendees
pub async fn update_attendance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(event_id): Path<i64>,
    Json(req): Json<UpdateAttendanceRequest>,
) -> ApiResult<event_attendance::Model> {
    ok(state
        .manager
        .decide_attendance(caller, event_id, req.user_id, req.status)
        .await?)
}

/// DELETE /api/events/:id/attendees
pub async fn delete_attendance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(event_id): Path<i64>,
    Json(req): Json<DeleteAttendanceRequest>,
) -> ApiResult<()> {
    state
        .manager
        .remove_attendance(caller, event_id, req.user_id)
        .await?;
    deleted()
}
