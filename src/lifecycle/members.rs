//! Membership operations

use serde::Serialize;
use tracing::{info, warn};

use super::manager::{require_caller, LifecycleManager};
use crate::entity::group_membership;
use crate::entity::user::UserSummary;
use crate::entity::UserId;
use crate::error::{AppError, AppResult, OptionExt};
use crate::membership::{self, MembershipState, MembershipView};
use crate::permission::{Operation, Scope};

/// A member listing row
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub user: UserSummary,
    pub membership: MembershipView,
}

impl LifecycleManager {
    async fn membership_row(
        &self,
        group_id: i64,
        member_id: UserId,
    ) -> AppResult<group_membership::Model> {
        self.store()
            .find_membership(group_id, member_id)
            .await?
            .ok_or_not_found("Membership between the user and the group does not exist")
    }

    /// Organizer and co-hosts see pending requests, everyone else only active members
    pub async fn list_members(&self, caller: Option<UserId>, group_id: i64) -> AppResult<Vec<MemberView>> {
        let group = self.group(group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        let scope = Self::check(&principal, Operation::ListMembers)?;

        let rows: Vec<group_membership::Model> = self
            .store()
            .list_memberships(group.id)
            .await?
            .into_iter()
            .filter(|m| scope == Scope::Full || MembershipState::from(m).is_active())
            .collect();

        let ids: Vec<UserId> = rows.iter().map(|m| m.user_id).collect();
        let users = self.users_by_id(&ids).await?;

        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            match users.get(&row.user_id) {
                Some(user) => members.push(MemberView {
                    user: UserSummary::from(user),
                    membership: MembershipState::from(&row).into(),
                }),
                None => warn!("Membership {} references missing user {}", row.id, row.user_id),
            }
        }
        Ok(members)
    }

    /// `absent -> pending` for the caller
    pub async fn request_membership(
        &self,
        caller: Option<UserId>,
        group_id: i64,
    ) -> AppResult<group_membership::Model> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::RequestMembership)?;

        let state = membership::request(principal.membership)?;
        let row = self.store().insert_membership(group.id, user_id, state).await?;
        info!("User {} requested membership of group {}", user_id, group.id);
        Ok(row)
    }

    /// Approve a pending request or change an active member's role
    pub async fn change_membership(
        &self,
        caller: Option<UserId>,
        group_id: i64,
        member_id: UserId,
        target: MembershipState,
    ) -> AppResult<group_membership::Model> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        let row = self.membership_row(group.id, member_id).await?;
        let from = MembershipState::from(&row);
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::ChangeMembership { from, to: target })?;

        let next = membership::transition(from, target)?;
        let updated = self.store().set_membership_state(row.id, from, next).await?;
        info!(
            "Membership of user {} in group {} changed {:?} -> {:?} by user {}",
            member_id, group.id, from, next, user_id
        );
        Ok(updated)
    }

    /// Leave a group, or have the organizer remove someone
    pub async fn remove_membership(
        &self,
        caller: Option<UserId>,
        group_id: i64,
        member_id: UserId,
    ) -> AppResult<()> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        let row = self.membership_row(group.id, member_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::RemoveMembership { member_id })?;

        if member_id == group.organizer_id {
            return Err(AppError::conflict(
                "The organizer's membership cannot be removed while the group exists",
            ));
        }
        membership::ensure_removable(MembershipState::from(&row))?;

        self.store().delete_membership(row.id).await?;
        info!("Membership of user {} in group {} removed by user {}", member_id, group.id, user_id);
        Ok(())
    }
}
