//! Attendance operations

use serde::Serialize;
use tracing::{info, warn};

use super::manager::{require_caller, LifecycleManager};
use crate::attendance;
use crate::entity::event_attendance::{self, AttendanceStatus};
use crate::entity::user::UserSummary;
use crate::entity::UserId;
use crate::error::{AppResult, OptionExt};
use crate::permission::Operation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    pub status: AttendanceStatus,
}

/// An attendee listing row
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeView {
    #[serde(flatten)]
    pub user: UserSummary,
    pub attendance: AttendanceView,
}

impl LifecycleManager {
    async fn attendance_row(
        &self,
        event_id: i64,
        attendee_id: UserId,
    ) -> AppResult<event_attendance::Model> {
        self.store()
            .find_attendance(event_id, attendee_id)
            .await?
            .ok_or_not_found("Attendance between the user and the event does not exist")
    }

    /// Pending requests are listed only for the organizer and co-hosts
    pub async fn list_attendees(&self, caller: Option<UserId>, event_id: i64) -> AppResult<Vec<AttendeeView>> {
        let event = self.event(event_id).await?;
        let group = self.group(event.group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        let scope = Self::check(&principal, Operation::ListAttendees)?;

        let rows: Vec<event_attendance::Model> = self
            .store()
            .list_attendances(event.id)
            .await?
            .into_iter()
            .filter(|a| attendance::visible(scope, a.status))
            .collect();

        let ids: Vec<UserId> = rows.iter().map(|a| a.user_id).collect();
        let users = self.users_by_id(&ids).await?;

        let mut attendees = Vec::with_capacity(rows.len());
        for row in rows {
            match users.get(&row.user_id) {
                Some(user) => attendees.push(AttendeeView {
                    user: UserSummary::from(user),
                    attendance: AttendanceView { status: row.status },
                }),
                None => warn!("Attendance {} references missing user {}", row.id, row.user_id),
            }
        }
        Ok(attendees)
    }

    /// `absent -> pending` for the caller; requires an active membership
    pub async fn request_attendance(
        &self,
        caller: Option<UserId>,
        event_id: i64,
    ) -> AppResult<event_attendance::Model> {
        let user_id = require_caller(caller)?;
        let event = self.event(event_id).await?;
        let group = self.group(event.group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::RequestAttendance)?;

        let existing = self.store().find_attendance(event.id, user_id).await?;
        let status = attendance::request(existing.map(|a| a.status))?;
        let row = self.store().insert_attendance(event.id, user_id, status).await?;
        info!("User {} requested to attend event {}", user_id, event.id);
        Ok(row)
    }

    /// `pending -> accepted | rejected`
    pub async fn decide_attendance(
        &self,
        caller: Option<UserId>,
        event_id: i64,
        attendee_id: UserId,
        status: AttendanceStatus,
    ) -> AppResult<event_attendance::Model> {
        let user_id = require_caller(caller)?;
        let event = self.event(event_id).await?;
        let group = self.group(event.group_id).await?;
        let row = self.attendance_row(event.id, attendee_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::DecideAttendance)?;

        let next = attendance::decide(row.status, status)?;
        let updated = self.store().set_attendance_status(row.id, row.status, next).await?;
        info!(
            "Attendance of user {} at event {} set to {:?} by user {}",
            attendee_id, event.id, next, user_id
        );
        Ok(updated)
    }

    pub async fn remove_attendance(
        &self,
        caller: Option<UserId>,
        event_id: i64,
        attendee_id: UserId,
    ) -> AppResult<()> {
        let user_id = require_caller(caller)?;
        let event = self.event(event_id).await?;
        let group = self.group(event.group_id).await?;
        let row = self.attendance_row(event.id, attendee_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::RemoveAttendance { attendee_id })?;

        self.store().delete_attendance(row.id).await?;
        info!("Attendance of user {} at event {} removed by user {}", attendee_id, event.id, user_id);
        Ok(())
    }
}
