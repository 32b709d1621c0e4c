//! Event attendance lifecycle
//!
//! `absent -> pending -> accepted | rejected`. Both decisions are terminal and a
//! rejected user cannot request again.

use crate::entity::event_attendance::AttendanceStatus;
use crate::error::{AppError, AppResult};
use crate::permission::Scope;

/// `absent -> pending`. Any existing row is a conflict.
pub fn request(existing: Option<AttendanceStatus>) -> AppResult<AttendanceStatus> {
    match existing {
        None => Ok(AttendanceStatus::Pending),
        Some(AttendanceStatus::Pending) => {
            Err(AppError::conflict("Attendance has already been requested"))
        }
        Some(AttendanceStatus::Accepted) => {
            Err(AppError::conflict("User is already an attendee of the event"))
        }
        Some(AttendanceStatus::Rejected) => {
            Err(AppError::conflict("Attendance request was rejected"))
        }
    }
}

/// `pending -> accepted | rejected`
pub fn decide(from: AttendanceStatus, to: AttendanceStatus) -> AppResult<AttendanceStatus> {
    match (from, to) {
        (_, AttendanceStatus::Pending) => Err(AppError::conflict(
            "Cannot change an attendance status to pending",
        )),
        (AttendanceStatus::Pending, decided) => Ok(decided),
        (_, _) => Err(AppError::conflict("Attendance has already been decided")),
    }
}

/// Limited listings never show pending requests
pub fn visible(scope: Scope, status: AttendanceStatus) -> bool {
    match scope {
        Scope::Full => true,
        Scope::Limited => status != AttendanceStatus::Pending,
    }
}
