//! Group handlers

use axum::extract::{Path, State};
use axum::Json;

use super::{created, deleted, ok, ApiResult, Created};
use crate::entity::group::{self, GroupFields};
use crate::middleware::Caller;
use crate::state::AppState;

/// GET /api/groups
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Vec<group::Model>> {
    ok(state.manager.list_groups().await?)
}

/// GET /api/groups/current
pub async fn current_groups(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Vec<group::Model>> {
    ok(state.manager.groups_of_caller(caller).await?)
}

/// GET /api/groups/:id
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> ApiResult<group::Model> {
    ok(state.manager.get_group(group_id).await?)
}

/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(fields): Json<GroupFields>,
) -> Created<group::Model> {
    created(state.manager.create_group(caller, fields).await?)
}

/// PUT /api/groups/:id
pub async fn update_group(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
    Json(fields): Json<GroupFields>,
) -> ApiResult<group::Model> {
    ok(state.manager.update_group(caller, group_id, fields).await?)
}

/// DELETE /api/groups/:id
pub async fn delete_group(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
) -> ApiResult<()> {
    state.manager.delete_group(caller, group_id).await?;
    deleted()
}
