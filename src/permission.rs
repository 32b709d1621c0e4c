//! Authorization engine
//!
//! A pure decision over the caller's identity and their membership in the
//! group that owns the target resource. Existence of the resource has already
//! been checked by the caller of [`authorize`]; nothing here touches storage.

use crate::entity::group_membership::MemberRole;
use crate::entity::UserId;
use crate::error::{AppError, AppResult};
use crate::membership::{self, MembershipState};

/// Who is asking, relative to one group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Option<UserId>,
    /// Caller's membership in the owning group, if any
    pub membership: Option<MembershipState>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user_id: Option<UserId>, membership: Option<MembershipState>) -> Self {
        Self { user_id, membership }
    }

    fn role(&self) -> Option<MemberRole> {
        self.membership.and_then(MembershipState::role)
    }

    fn has_role(&self, required: MemberRole) -> bool {
        self.role().map_or(false, |role| role.at_least(required))
    }
}

/// Operation classes with distinct authorization rules
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateGroup,
    UpdateGroup { organizer_id: UserId },
    DeleteGroup { organizer_id: UserId },
    CreateVenue,
    UpdateVenue,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    CreateImage,
    ListGroupsOfCaller,
    ListMembers,
    RequestMembership,
    ChangeMembership { from: MembershipState, to: MembershipState },
    RemoveMembership { member_id: UserId },
    ListAttendees,
    RequestAttendance,
    DecideAttendance,
    RemoveAttendance { attendee_id: UserId },
}

impl Operation {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateGroup => "create-group",
            Operation::UpdateGroup { .. } => "update-group",
            Operation::DeleteGroup { .. } => "delete-group",
            Operation::CreateVenue => "create-venue",
            Operation::UpdateVenue => "update-venue",
            Operation::CreateEvent => "create-event",
            Operation::UpdateEvent => "update-event",
            Operation::DeleteEvent => "delete-event",
            Operation::CreateImage => "create-image",
            Operation::ListGroupsOfCaller => "list-own-groups",
            Operation::ListMembers => "list-members",
            Operation::RequestMembership => "request-membership",
            Operation::ChangeMembership { .. } => "change-membership",
            Operation::RemoveMembership { .. } => "remove-membership",
            Operation::ListAttendees => "list-attendees",
            Operation::RequestAttendance => "request-attendance",
            Operation::DecideAttendance => "decide-attendance",
            Operation::RemoveAttendance { .. } => "remove-attendance",
        }
    }

    fn requires_identity(&self) -> bool {
        !matches!(
            self,
            Operation::ListMembers | Operation::ListAttendees
        )
    }
}

/// How much of a listing the caller may see
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Full,
    /// Pending rows hidden
    Limited,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Unauthorized(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow(Scope),
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn into_result(self) -> AppResult<Scope> {
        match self {
            Decision::Allow(scope) => Ok(scope),
            Decision::Deny(Denial::Unauthenticated) => Err(AppError::Unauthenticated),
            Decision::Deny(Denial::Unauthorized(reason)) => Err(AppError::unauthorized(reason)),
        }
    }
}

fn allow() -> Decision {
    Decision::Allow(Scope::Full)
}

fn allow_if(cond: bool, reason: &'static str) -> Decision {
    if cond {
        allow()
    } else {
        Decision::Deny(Denial::Unauthorized(reason))
    }
}

/// Decide whether `principal` may perform `op`
pub fn authorize(principal: &Principal, op: &Operation) -> Decision {
    let caller = match principal.user_id {
        Some(id) => id,
        None if op.requires_identity() => return Decision::Deny(Denial::Unauthenticated),
        // anonymous listings never include pending rows
        None => return Decision::Allow(Scope::Limited),
    };

    match *op {
        Operation::CreateGroup | Operation::ListGroupsOfCaller => allow(),

        Operation::UpdateGroup { organizer_id } | Operation::DeleteGroup { organizer_id } => {
            allow_if(caller == organizer_id, "Only the group organizer can do this")
        }

        Operation::CreateVenue | Operation::UpdateVenue => allow_if(
            principal.has_role(MemberRole::Organizer),
            "Only the group organizer can manage venues",
        ),

        Operation::CreateEvent | Operation::UpdateEvent | Operation::DeleteEvent => allow_if(
            principal.has_role(MemberRole::CoHost),
            "Only the organizer or a co-host can manage events",
        ),

        Operation::CreateImage => allow_if(
            principal.has_role(MemberRole::Member),
            "Only group members can add images",
        ),

        Operation::ListMembers | Operation::ListAttendees => {
            if principal.has_role(MemberRole::CoHost) {
                Decision::Allow(Scope::Full)
            } else {
                Decision::Allow(Scope::Limited)
            }
        }

        // Duplicates are a state conflict, reported by the state machine
        Operation::RequestMembership => allow(),

        Operation::ChangeMembership { from, to } => {
            // Undefined transitions fall back to the approval baseline and are
            // then refused as a conflict by the state machine
            let required = membership::required_role(from, to).unwrap_or(MemberRole::CoHost);
            let reason = if required == MemberRole::Organizer {
                "Only the group organizer can change member roles"
            } else {
                "Only the organizer or a co-host can approve members"
            };
            allow_if(principal.has_role(required), reason)
        }

        Operation::RemoveMembership { member_id } => allow_if(
            caller == member_id || principal.has_role(MemberRole::Organizer),
            "Only the member or the group organizer can remove a membership",
        ),

        Operation::RequestAttendance => allow_if(
            principal.has_role(MemberRole::Member),
            "Only active group members can attend events",
        ),

        Operation::DecideAttendance => allow_if(
            principal.has_role(MemberRole::CoHost),
            "Only the organizer or a co-host can decide attendance",
        ),

        Operation::RemoveAttendance { attendee_id } => allow_if(
            caller == attendee_id || principal.has_role(MemberRole::Organizer),
            "Only the attendee or the group organizer can remove an attendance",
        ),
    }
}
