//! Entity store
//!
//! Persistence contract the lifecycle manager runs against. Implementations
//! must enforce one membership per (user, group) and one attendance per
//! (user, event), reporting a duplicate insert as [`AppError::Conflict`].
//!
//! [`AppError::Conflict`]: crate::error::AppError::Conflict

use async_trait::async_trait;

use crate::entity::event::{self, EventFields};
use crate::entity::event_attendance::{self, AttendanceStatus};
use crate::entity::group::{self, GroupFields};
use crate::entity::group_membership;
use crate::entity::image::{self, ImageOwner, NewImage};
use crate::entity::user::{self, NewUser};
use crate::entity::venue::{self, VenueFields};
use crate::entity::UserId;
use crate::error::AppResult;
use crate::membership::MembershipState;

pub mod memory;
pub mod sea;

pub use memory::InMemoryStore;
pub use sea::SeaOrmStore;

#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----
    async fn find_user(&self, id: UserId) -> AppResult<Option<user::Model>>;
    /// Look up by username or email
    async fn find_user_by_credential(&self, credential: &str) -> AppResult<Option<user::Model>>;
    async fn find_users(&self, ids: &[UserId]) -> AppResult<Vec<user::Model>>;
    async fn insert_user(&self, new: NewUser) -> AppResult<user::Model>;

    // ---- groups ----
    async fn list_groups(&self) -> AppResult<Vec<group::Model>>;
    /// Groups with any membership row for the user
    async fn groups_of_user(&self, user_id: UserId) -> AppResult<Vec<group::Model>>;
    async fn find_group(&self, id: i64) -> AppResult<Option<group::Model>>;
    /// Insert the group and its active organizer membership as one unit
    async fn create_group(&self, organizer_id: UserId, fields: GroupFields) -> AppResult<group::Model>;
    async fn update_group(&self, id: i64, fields: GroupFields) -> AppResult<group::Model>;
    /// Remove the group with every row hanging off it
    async fn delete_group(&self, id: i64) -> AppResult<()>;

    // ---- memberships ----
    async fn find_membership(
        &self,
        group_id: i64,
        user_id: UserId,
    ) -> AppResult<Option<group_membership::Model>>;
    async fn list_memberships(&self, group_id: i64) -> AppResult<Vec<group_membership::Model>>;
    async fn insert_membership(
        &self,
        group_id: i64,
        user_id: UserId,
        state: MembershipState,
    ) -> AppResult<group_membership::Model>;
    /// Compare-and-set: writes `to` only while the row is still in `from`,
    /// otherwise `Conflict`
    async fn set_membership_state(
        &self,
        id: i64,
        from: MembershipState,
        to: MembershipState,
    ) -> AppResult<group_membership::Model>;
    async fn delete_membership(&self, id: i64) -> AppResult<()>;

    // ---- venues ----
    async fn list_venues(&self, group_id: Option<i64>) -> AppResult<Vec<venue::Model>>;
    async fn find_venue(&self, id: i64) -> AppResult<Option<venue::Model>>;
    async fn insert_venue(&self, group_id: i64, fields: VenueFields) -> AppResult<venue::Model>;
    async fn update_venue(&self, id: i64, fields: VenueFields) -> AppResult<venue::Model>;

    // ---- events ----
    async fn list_events(&self, group_id: Option<i64>) -> AppResult<Vec<event::Model>>;
    async fn find_event(&self, id: i64) -> AppResult<Option<event::Model>>;
    async fn insert_event(&self, group_id: i64, fields: EventFields) -> AppResult<event::Model>;
    async fn update_event(&self, id: i64, fields: EventFields) -> AppResult<event::Model>;
    /// Remove the event with its attendances and images
    async fn delete_event(&self, id: i64) -> AppResult<()>;

    // ---- attendances ----
    async fn find_attendance(
        &self,
        event_id: i64,
        user_id: UserId,
    ) -> AppResult<Option<event_attendance::Model>>;
    async fn list_attendances(&self, event_id: i64) -> AppResult<Vec<event_attendance::Model>>;
    async fn insert_attendance(
        &self,
        event_id: i64,
        user_id: UserId,
        status: AttendanceStatus,
    ) -> AppResult<event_attendance::Model>;
    /// Compare-and-set, like [`Store::set_membership_state`]
    async fn set_attendance_status(
        &self,
        id: i64,
        from: AttendanceStatus,
        to: AttendanceStatus,
    ) -> AppResult<event_attendance::Model>;
    async fn delete_attendance(&self, id: i64) -> AppResult<()>;

    // ---- images ----
    /// `new` must already reference exactly one owner
    async fn insert_image(&self, new: NewImage) -> AppResult<image::Model>;
    async fn list_images(&self, owner: ImageOwner) -> AppResult<Vec<image::Model>>;
}
