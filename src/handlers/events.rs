//! Event handlers

use axum::extract::{Path, State};
use axum::Json;

use super::{created, deleted, ok, ApiResult, Created};
use crate::entity::event::{self, EventFields};
use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::AppState;

fn validate(fields: &EventFields) -> Result<(), AppError> {
    if fields.end_date < fields.start_date {
        return Err(AppError::Validation(
            "End date is less than start date".to_string(),
        ));
    }
    if fields.capacity < 0 {
        return Err(AppError::Validation("Capacity must be a non-negative integer".to_string()));
    }
    Ok(())
}

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Vec<event::Model>> {
    ok(state.manager.list_events(None).await?)
}

/// GET /api/groups/:id/events
pub async fn list_group_events(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> ApiResult<Vec<event::Model>> {
    ok(state.manager.list_events(Some(group_id)).await?)
}

/// GET /api/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> ApiResult<event::Model> {
    ok(state.manager.get_event(event_id).await?)
}

/// POST /api/groups/:id/events
pub async fn create_event(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
    Json(fields): Json<EventFields>,
) -> Created<event::Model> {
    validate(&fields)?;
    created(state.manager.create_event(caller, group_id, fields).await?)
}

/// PUT /api/events/:id
pub async fn update_event(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(event_id): Path<i64>,
    Json(fields): Json<EventFields>,
) -> ApiResult<event::Model> {
    validate(&fields)?;
    ok(state.manager.update_event(caller, event_id, fields).await?)
}

/// DELETE /api/events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(event_id): Path<i64>,
) -> ApiResult<()> {
    state.manager.delete_event(caller, event_id).await?;
    deleted()
}
