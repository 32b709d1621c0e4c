//! Group membership handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use super::{created, deleted, ok, ApiResult, Created};
use crate::entity::group_membership::{self, MemberRole};
use crate::entity::UserId;
use crate::lifecycle::MemberView;
use crate::membership::MembershipState;
use crate::middleware::Caller;
use crate::state::AppState;

/// Body of `PUT /api/groups/:id/members`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipRequest {
    pub member_id: UserId,
    pub status: String,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

/// Body of `DELETE /api/groups/:id/members`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMembershipRequest {
    pub member_id: UserId,
}

/// GET /api/groups/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
) -> ApiResult<Vec<MemberView>> {
    ok(state.manager.list_members(caller, group_id).await?)
}

/// POST /api/groups/:id/members
pub async fn request_membership(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
) -> Created<group_membership::Model> {
    created(state.manager.request_membership(caller, group_id).await?)
}

/// PUT /api/groups/:id/members
pub async fn update_membership(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
    Json(req): Json<UpdateMembershipRequest>,
) -> ApiResult<group_membership::Model> {
    let target = MembershipState::parse_target(&req.status, req.role)?;
    ok(state
        .manager
        .change_membership(caller, group_id, req.member_id, target)
        .await?)
}

/// DELETE /api/groups/:id/members
pub async fn delete_membership(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(group_id): Path<i64>,
    Json(req): Json<DeleteMembershipRequest>,
) -> ApiResult<()> {
    state
        .manager
        .remove_membership(caller, group_id, req.member_id)
        .await?;
    deleted()
}
