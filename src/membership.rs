//! Group membership lifecycle
//!
//! `absent -> pending -> active{member} -> active{co-host}`. Status and role
//! columns are folded into one [`MembershipState`] so that a role can never be
//! read off a pending row.

use serde::{Deserialize, Serialize};

use crate::entity::group_membership::{self, MemberRole, MembershipStatus};
use crate::error::{AppError, AppResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipState {
    Pending,
    Active(MemberRole),
}

impl MembershipState {
    pub fn from_columns(status: MembershipStatus, role: MemberRole) -> Self {
        match status {
            MembershipStatus::Pending => MembershipState::Pending,
            MembershipStatus::Active => MembershipState::Active(role),
        }
    }

    /// Pending rows store the default `member` role
    pub fn columns(self) -> (MembershipStatus, MemberRole) {
        match self {
            MembershipState::Pending => (MembershipStatus::Pending, MemberRole::Member),
            MembershipState::Active(role) => (MembershipStatus::Active, role),
        }
    }

    /// Role of an active membership, `None` while pending
    pub fn role(self) -> Option<MemberRole> {
        match self {
            MembershipState::Pending => None,
            MembershipState::Active(role) => Some(role),
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, MembershipState::Active(_))
    }

    /// Parse the target of a membership update.
    ///
    /// `status` accepts `pending`, `active`, or a role name directly
    /// (`member`, `co-host`, `organizer`); `role` refines `active`.
    pub fn parse_target(status: &str, role: Option<MemberRole>) -> AppResult<Self> {
        match (status, role) {
            ("pending", _) => Ok(MembershipState::Pending),
            ("active", role) => Ok(MembershipState::Active(role.unwrap_or(MemberRole::Member))),
            ("member", None) => Ok(MembershipState::Active(MemberRole::Member)),
            ("co-host", None) => Ok(MembershipState::Active(MemberRole::CoHost)),
            ("organizer", None) => Ok(MembershipState::Active(MemberRole::Organizer)),
            (other, _) => Err(AppError::Validation(format!(
                "Unknown membership status: {}",
                other
            ))),
        }
    }
}

impl From<&group_membership::Model> for MembershipState {
    fn from(model: &group_membership::Model) -> Self {
        MembershipState::from_columns(model.status, model.role)
    }
}

/// Wire shape of a membership, `{ "status": ..., "role": ... }`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipView {
    pub status: MembershipStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
}

impl From<MembershipState> for MembershipView {
    fn from(state: MembershipState) -> Self {
        let (status, _) = state.columns();
        Self {
            status,
            role: state.role(),
        }
    }
}

/// `absent -> pending`. Any existing row, pending or active, is a conflict.
pub fn request(existing: Option<MembershipState>) -> AppResult<MembershipState> {
    match existing {
        None => Ok(MembershipState::Pending),
        Some(MembershipState::Pending) => {
            Err(AppError::conflict("Membership has already been requested"))
        }
        Some(MembershipState::Active(_)) => {
            Err(AppError::conflict("User is already a member of the group"))
        }
    }
}

/// Minimum caller role for a transition, `None` if the transition does not exist
pub fn required_role(from: MembershipState, to: MembershipState) -> Option<MemberRole> {
    use MemberRole::*;
    use MembershipState::*;

    match (from, to) {
        (Pending, Active(Member)) => Some(CoHost),
        (Active(Member), Active(CoHost)) => Some(Organizer),
        (Active(CoHost), Active(Member)) => Some(Organizer),
        _ => None,
    }
}

/// Validate a status/role change and return the new state
pub fn transition(from: MembershipState, to: MembershipState) -> AppResult<MembershipState> {
    if required_role(from, to).is_some() {
        return Ok(to);
    }

    let reason = match (from, to) {
        (_, MembershipState::Pending) => "A membership cannot be set back to pending",
        (_, MembershipState::Active(MemberRole::Organizer)) => {
            "The organizer role cannot be granted"
        }
        (MembershipState::Active(MemberRole::Organizer), _) => {
            "The organizer's membership cannot be changed"
        }
        (MembershipState::Pending, MembershipState::Active(_)) => {
            "A pending membership must be approved as member first"
        }
        _ if from == to => "Membership already has the requested status",
        _ => "Invalid membership transition",
    };
    Err(AppError::conflict(reason))
}

/// `active{X} -> absent`, refused for the group's recorded organizer
pub fn ensure_removable(state: MembershipState) -> AppResult<()> {
    if state == MembershipState::Active(MemberRole::Organizer) {
        return Err(AppError::conflict(
            "The organizer's membership cannot be removed while the group exists",
        ));
    }
    Ok(())
}
