use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::entity::event::{self, EventFields};
use crate::entity::group::{self, GroupFields};
use crate::entity::image::{self, ImageOwner, NewImage};
use crate::entity::user;
use crate::entity::venue::{self, VenueFields};
use crate::entity::UserId;
use crate::error::{AppError, AppResult, OptionExt};
use crate::membership::MembershipState;
use crate::permission::{authorize, Operation, Principal, Scope};
use crate::store::Store;

/// Orchestrates create/read/update/delete over the entity store
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn Store>,
}

/// Mutations need an identity before anything is resolved
pub(super) fn require_caller(caller: Option<UserId>) -> AppResult<UserId> {
    caller.ok_or(AppError::Unauthenticated)
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    // ==================== Resolution ====================

    pub(super) async fn group(&self, id: i64) -> AppResult<group::Model> {
        self.store
            .find_group(id)
            .await?
            .ok_or_not_found("Group couldn't be found")
    }

    pub(super) async fn event(&self, id: i64) -> AppResult<event::Model> {
        self.store
            .find_event(id)
            .await?
            .ok_or_not_found("Event couldn't be found")
    }

    pub(super) async fn venue(&self, id: i64) -> AppResult<venue::Model> {
        self.store
            .find_venue(id)
            .await?
            .ok_or_not_found("Venue couldn't be found")
    }

    /// An event's venue must belong to the event's group
    async fn ensure_venue_in_group(&self, venue_id: Option<i64>, group_id: i64) -> AppResult<()> {
        if let Some(venue_id) = venue_id {
            let venue = self.venue(venue_id).await?;
            if venue.group_id != group_id {
                return Err(AppError::NotFound("Venue couldn't be found".to_string()));
            }
        }
        Ok(())
    }

    /// Group that ultimately owns an image target
    async fn owning_group(&self, owner: ImageOwner) -> AppResult<group::Model> {
        let group_id = match owner {
            ImageOwner::Group(id) => id,
            ImageOwner::Event(id) => self.event(id).await?.group_id,
            ImageOwner::Venue(id) => self.venue(id).await?.group_id,
        };
        self.group(group_id).await
    }

    /// Caller's current standing in a group, read fresh from the store
    pub(super) async fn principal(&self, caller: Option<UserId>, group_id: i64) -> AppResult<Principal> {
        let Some(user_id) = caller else {
            return Ok(Principal::anonymous());
        };
        let membership = self
            .store
            .find_membership(group_id, user_id)
            .await?
            .map(|m| MembershipState::from(&m));
        Ok(Principal::new(Some(user_id), membership))
    }

    pub(super) fn check(principal: &Principal, op: Operation) -> AppResult<Scope> {
        let decision = authorize(principal, &op);
        if !decision.is_allowed() {
            debug!("Denied {} for user {:?}", op.name(), principal.user_id);
        }
        decision.into_result()
    }

    pub(super) async fn users_by_id(&self, ids: &[UserId]) -> AppResult<HashMap<UserId, user::Model>> {
        Ok(self
            .store
            .find_users(ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }

    // ==================== Groups ====================

    pub async fn list_groups(&self) -> AppResult<Vec<group::Model>> {
        self.store.list_groups().await
    }

    /// Groups the caller has any membership row in
    pub async fn groups_of_caller(&self, caller: Option<UserId>) -> AppResult<Vec<group::Model>> {
        let user_id = require_caller(caller)?;
        Self::check(&Principal::new(caller, None), Operation::ListGroupsOfCaller)?;
        self.store.groups_of_user(user_id).await
    }

    pub async fn get_group(&self, group_id: i64) -> AppResult<group::Model> {
        self.group(group_id).await
    }

    /// The caller becomes the organizer, recorded on the group and as a membership
    pub async fn create_group(&self, caller: Option<UserId>, fields: GroupFields) -> AppResult<group::Model> {
        let user_id = require_caller(caller)?;
        Self::check(&Principal::new(caller, None), Operation::CreateGroup)?;

        let group = self.store.create_group(user_id, fields).await?;
        info!("Group {} created by user {}", group.id, user_id);
        Ok(group)
    }

    pub async fn update_group(
        &self,
        caller: Option<UserId>,
        group_id: i64,
        fields: GroupFields,
    ) -> AppResult<group::Model> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::UpdateGroup { organizer_id: group.organizer_id })?;

        let updated = self.store.update_group(group.id, fields).await?;
        info!("Group {} updated by user {}", group.id, user_id);
        Ok(updated)
    }

    pub async fn delete_group(&self, caller: Option<UserId>, group_id: i64) -> AppResult<()> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::DeleteGroup { organizer_id: group.organizer_id })?;

        self.store.delete_group(group.id).await?;
        info!("Group {} deleted by user {}", group.id, user_id);
        Ok(())
    }

    // ==================== Venues ====================

    pub async fn list_venues(&self, group_id: Option<i64>) -> AppResult<Vec<venue::Model>> {
        if let Some(group_id) = group_id {
            self.group(group_id).await?;
        }
        self.store.list_venues(group_id).await
    }

    pub async fn get_venue(&self, venue_id: i64) -> AppResult<venue::Model> {
        self.venue(venue_id).await
    }

    pub async fn create_venue(
        &self,
        caller: Option<UserId>,
        group_id: i64,
        fields: VenueFields,
    ) -> AppResult<venue::Model> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::CreateVenue)?;

        let venue = self.store.insert_venue(group.id, fields).await?;
        info!("Venue {} added to group {} by user {}", venue.id, group.id, user_id);
        Ok(venue)
    }

    pub async fn update_venue(
        &self,
        caller: Option<UserId>,
        venue_id: i64,
        fields: VenueFields,
    ) -> AppResult<venue::Model> {
        let user_id = require_caller(caller)?;
        let venue = self.venue(venue_id).await?;
        let group = self.group(venue.group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::UpdateVenue)?;

        let updated = self.store.update_venue(venue.id, fields).await?;
        info!("Venue {} updated by user {}", venue.id, user_id);
        Ok(updated)
    }

    // ==================== Events ====================

    pub async fn list_events(&self, group_id: Option<i64>) -> AppResult<Vec<event::Model>> {
        if let Some(group_id) = group_id {
            self.group(group_id).await?;
        }
        self.store.list_events(group_id).await
    }

    pub async fn get_event(&self, event_id: i64) -> AppResult<event::Model> {
        self.event(event_id).await
    }

    pub async fn create_event(
        &self,
        caller: Option<UserId>,
        group_id: i64,
        fields: EventFields,
    ) -> AppResult<event::Model> {
        let user_id = require_caller(caller)?;
        let group = self.group(group_id).await?;
        self.ensure_venue_in_group(fields.venue_id, group.id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::CreateEvent)?;

        let event = self.store.insert_event(group.id, fields).await?;
        info!("Event {} created in group {} by user {}", event.id, group.id, user_id);
        Ok(event)
    }

    pub async fn update_event(
        &self,
        caller: Option<UserId>,
        event_id: i64,
        fields: EventFields,
    ) -> AppResult<event::Model> {
        let user_id = require_caller(caller)?;
        let event = self.event(event_id).await?;
        let group = self.group(event.group_id).await?;
        self.ensure_venue_in_group(fields.venue_id, group.id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::UpdateEvent)?;

        let updated = self.store.update_event(event.id, fields).await?;
        info!("Event {} updated by user {}", event.id, user_id);
        Ok(updated)
    }

    pub async fn delete_event(&self, caller: Option<UserId>, event_id: i64) -> AppResult<()> {
        let user_id = require_caller(caller)?;
        let event = self.event(event_id).await?;
        let group = self.group(event.group_id).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::DeleteEvent)?;

        self.store.delete_event(event.id).await?;
        info!("Event {} deleted by user {}", event.id, user_id);
        Ok(())
    }

    // ==================== Images ====================

    /// Attach an image to exactly one group, event or venue
    pub async fn create_image(&self, caller: Option<UserId>, new: NewImage) -> AppResult<image::Model> {
        let user_id = require_caller(caller)?;
        let owner = new.owner()?;
        let group = self.owning_group(owner).await?;
        let principal = self.principal(caller, group.id).await?;
        Self::check(&principal, Operation::CreateImage)?;

        let image = self.store.insert_image(new).await?;
        info!("Image {} attached to {:?} by user {}", image.id, owner, user_id);
        Ok(image)
    }

    pub async fn list_images(&self, owner: ImageOwner) -> AppResult<Vec<image::Model>> {
        self.owning_group(owner).await?;
        self.store.list_images(owner).await
    }
}
