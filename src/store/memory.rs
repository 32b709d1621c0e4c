//! In-memory entity store
//!
//! All tables sit behind one lock, so every trait call is atomic and the
//! uniqueness checks cannot race with inserts.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::Store;
use crate::entity::event::{self, EventFields};
use crate::entity::event_attendance::{self, AttendanceStatus};
use crate::entity::group::{self, GroupFields};
use crate::entity::group_membership::{self, MemberRole};
use crate::entity::image::{self, ImageOwner, NewImage};
use crate::entity::user::{self, NewUser};
use crate::entity::venue::{self, VenueFields};
use crate::entity::UserId;
use crate::error::{AppError, AppResult, OptionExt};
use crate::membership::MembershipState;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, user::Model>,
    groups: BTreeMap<i64, group::Model>,
    memberships: BTreeMap<i64, group_membership::Model>,
    venues: BTreeMap<i64, venue::Model>,
    events: BTreeMap<i64, event::Model>,
    attendances: BTreeMap<i64, event_attendance::Model>,
    images: BTreeMap<i64, image::Model>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn membership_of(&self, group_id: i64, user_id: UserId) -> Option<&group_membership::Model> {
        self.memberships
            .values()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
    }

    fn attendance_of(&self, event_id: i64, user_id: UserId) -> Option<&event_attendance::Model> {
        self.attendances
            .values()
            .find(|a| a.event_id == event_id && a.user_id == user_id)
    }

    fn new_membership(
        &mut self,
        group_id: i64,
        user_id: UserId,
        state: MembershipState,
    ) -> AppResult<group_membership::Model> {
        if self.membership_of(group_id, user_id).is_some() {
            return Err(AppError::conflict("Membership already exists"));
        }
        let (status, role) = state.columns();
        let model = group_membership::Model {
            id: self.next_id(),
            user_id,
            group_id,
            status,
            role,
        };
        self.memberships.insert(model.id, model.clone());
        Ok(model)
    }

    fn remove_event(&mut self, event_id: i64) {
        self.events.remove(&event_id);
        self.attendances.retain(|_, a| a.event_id != event_id);
        self.images.retain(|_, i| i.event_id != Some(event_id));
    }
}

/// Process-local [`Store`]; nothing survives a restart
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<user::Model>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_credential(&self, credential: &str) -> AppResult<Option<user::Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == credential || u.email == credential)
            .cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> AppResult<Vec<user::Model>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }

    async fn insert_user(&self, new: NewUser) -> AppResult<user::Model> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(AppError::conflict("User with that username or email already exists"));
        }
        let model = user::Model {
            id: tables.next_id(),
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            hashed_password: new.hashed_password,
        };
        tables.users.insert(model.id, model.clone());
        Ok(model)
    }

    async fn list_groups(&self) -> AppResult<Vec<group::Model>> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn groups_of_user(&self, user_id: UserId) -> AppResult<Vec<group::Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.groups.get(&m.group_id).cloned())
            .collect())
    }

    async fn find_group(&self, id: i64) -> AppResult<Option<group::Model>> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn create_group(&self, organizer_id: UserId, fields: GroupFields) -> AppResult<group::Model> {
        let mut tables = self.tables.write().await;
        let model = group::Model {
            id: tables.next_id(),
            organizer_id,
            name: fields.name,
            about: fields.about,
            kind: fields.kind,
            visibility: fields.visibility,
            city: fields.city,
            state: fields.state,
        };
        tables.groups.insert(model.id, model.clone());
        tables.new_membership(
            model.id,
            organizer_id,
            MembershipState::Active(MemberRole::Organizer),
        )?;
        Ok(model)
    }

    async fn update_group(&self, id: i64, fields: GroupFields) -> AppResult<group::Model> {
        let mut tables = self.tables.write().await;
        let group = tables.groups.get_mut(&id).ok_or_not_found("Group couldn't be found")?;
        group.name = fields.name;
        group.about = fields.about;
        group.kind = fields.kind;
        group.visibility = fields.visibility;
        group.city = fields.city;
        group.state = fields.state;
        Ok(group.clone())
    }

    async fn delete_group(&self, id: i64) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let event_ids: Vec<i64> = tables
            .events
            .values()
            .filter(|e| e.group_id == id)
            .map(|e| e.id)
            .collect();
        for event_id in event_ids {
            tables.remove_event(event_id);
        }
        let venue_ids: Vec<i64> = tables
            .venues
            .values()
            .filter(|v| v.group_id == id)
            .map(|v| v.id)
            .collect();
        tables
            .images
            .retain(|_, i| i.group_id != Some(id) && !i.venue_id.map_or(false, |v| venue_ids.contains(&v)));
        tables.venues.retain(|_, v| v.group_id != id);
        tables.memberships.retain(|_, m| m.group_id != id);
        tables.groups.remove(&id);
        Ok(())
    }

    async fn find_membership(
        &self,
        group_id: i64,
        user_id: UserId,
    ) -> AppResult<Option<group_membership::Model>> {
        Ok(self.tables.read().await.membership_of(group_id, user_id).cloned())
    }

    async fn list_memberships(&self, group_id: i64) -> AppResult<Vec<group_membership::Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn insert_membership(
        &self,
        group_id: i64,
        user_id: UserId,
        state: MembershipState,
    ) -> AppResult<group_membership::Model> {
        self.tables.write().await.new_membership(group_id, user_id, state)
    }

    async fn set_membership_state(
        &self,
        id: i64,
        from: MembershipState,
        to: MembershipState,
    ) -> AppResult<group_membership::Model> {
        let mut tables = self.tables.write().await;
        let membership = tables
            .memberships
            .get_mut(&id)
            .ok_or_not_found("Membership couldn't be found")?;
        if MembershipState::from(&*membership) != from {
            return Err(AppError::conflict("Membership was changed by another request"));
        }
        let (status, role) = to.columns();
        membership.status = status;
        membership.role = role;
        Ok(membership.clone())
    }

    async fn delete_membership(&self, id: i64) -> AppResult<()> {
        self.tables.write().await.memberships.remove(&id);
        Ok(())
    }

    async fn list_venues(&self, group_id: Option<i64>) -> AppResult<Vec<venue::Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .venues
            .values()
            .filter(|v| group_id.map_or(true, |g| v.group_id == g))
            .cloned()
            .collect())
    }

    async fn find_venue(&self, id: i64) -> AppResult<Option<venue::Model>> {
        Ok(self.tables.read().await.venues.get(&id).cloned())
    }

    async fn insert_venue(&self, group_id: i64, fields: VenueFields) -> AppResult<venue::Model> {
        let mut tables = self.tables.write().await;
        let model = venue::Model {
            id: tables.next_id(),
            group_id,
            address: fields.address,
            city: fields.city,
            state: fields.state,
            lat: fields.lat,
            lng: fields.lng,
        };
        tables.venues.insert(model.id, model.clone());
        Ok(model)
    }

    async fn update_venue(&self, id: i64, fields: VenueFields) -> AppResult<venue::Model> {
        let mut tables = self.tables.write().await;
        let venue = tables.venues.get_mut(&id).ok_or_not_found("Venue couldn't be found")?;
        venue.address = fields.address;
        venue.city = fields.city;
        venue.state = fields.state;
        venue.lat = fields.lat;
        venue.lng = fields.lng;
        Ok(venue.clone())
    }

    async fn list_events(&self, group_id: Option<i64>) -> AppResult<Vec<event::Model>> {
        let tables = self.tables.read().await;
        let mut events: Vec<event::Model> = tables
            .events
            .values()
            .filter(|e| group_id.map_or(true, |g| e.group_id == g))
            .cloned()
            .collect();
        // same order as the SQL store: start date, ties by id
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn find_event(&self, id: i64) -> AppResult<Option<event::Model>> {
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn insert_event(&self, group_id: i64, fields: EventFields) -> AppResult<event::Model> {
        let mut tables = self.tables.write().await;
        let model = event::Model {
            id: tables.next_id(),
            group_id,
            venue_id: fields.venue_id,
            name: fields.name,
            kind: fields.kind,
            capacity: fields.capacity,
            price: fields.price,
            description: fields.description,
            start_date: fields.start_date,
            end_date: fields.end_date,
        };
        tables.events.insert(model.id, model.clone());
        Ok(model)
    }

    async fn update_event(&self, id: i64, fields: EventFields) -> AppResult<event::Model> {
        let mut tables = self.tables.write().await;
        let event = tables.events.get_mut(&id).ok_or_not_found("Event couldn't be found")?;
        event.venue_id = fields.venue_id;
        event.name = fields.name;
        event.kind = fields.kind;
        event.capacity = fields.capacity;
        event.price = fields.price;
        event.description = fields.description;
        event.start_date = fields.start_date;
        event.end_date = fields.end_date;
        Ok(event.clone())
    }

    async fn delete_event(&self, id: i64) -> AppResult<()> {
        self.tables.write().await.remove_event(id);
        Ok(())
    }

    async fn find_attendance(
        &self,
        event_id: i64,
        user_id: UserId,
    ) -> AppResult<Option<event_attendance::Model>> {
        Ok(self.tables.read().await.attendance_of(event_id, user_id).cloned())
    }

    async fn list_attendances(&self, event_id: i64) -> AppResult<Vec<event_attendance::Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendances
            .values()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn insert_attendance(
        &self,
        event_id: i64,
        user_id: UserId,
        status: AttendanceStatus,
    ) -> AppResult<event_attendance::Model> {
        let mut tables = self.tables.write().await;
        if tables.attendance_of(event_id, user_id).is_some() {
            return Err(AppError::conflict("Attendance already exists"));
        }
        let model = event_attendance::Model {
            id: tables.next_id(),
            user_id,
            event_id,
            status,
        };
        tables.attendances.insert(model.id, model.clone());
        Ok(model)
    }

    async fn set_attendance_status(
        &self,
        id: i64,
        from: AttendanceStatus,
        to: AttendanceStatus,
    ) -> AppResult<event_attendance::Model> {
        let mut tables = self.tables.write().await;
        let attendance = tables
            .attendances
            .get_mut(&id)
            .ok_or_not_found("Attendance couldn't be found")?;
        if attendance.status != from {
            return Err(AppError::conflict("Attendance was changed by another request"));
        }
        attendance.status = to;
        Ok(attendance.clone())
    }

    async fn delete_attendance(&self, id: i64) -> AppResult<()> {
        self.tables.write().await.attendances.remove(&id);
        Ok(())
    }

    async fn insert_image(&self, new: NewImage) -> AppResult<image::Model> {
        let owner = new.owner()?;
        let (group_id, event_id, venue_id) = owner.refs();
        let mut tables = self.tables.write().await;
        let model = image::Model {
            id: tables.next_id(),
            url: new.url,
            preview: new.preview,
            group_id,
            event_id,
            venue_id,
        };
        tables.images.insert(model.id, model.clone());
        Ok(model)
    }

    async fn list_images(&self, owner: ImageOwner) -> AppResult<Vec<image::Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .images
            .values()
            .filter(|i| i.owner() == Some(owner))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::group::Visibility;
    use crate::entity::group_membership::MembershipStatus;

    fn fields() -> GroupFields {
        GroupFields {
            name: "Evening Tennis".to_string(),
            about: "Doubles on the courts by the river".to_string(),
            kind: "In person".to_string(),
            visibility: Visibility::Public,
            city: "Austin".to_string(),
            state: "TX".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_group_records_organizer() {
        let store = InMemoryStore::new();
        let group = store.create_group(7, fields()).await.unwrap();
        let rows = store.list_memberships(group.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 7);
        assert_eq!(rows[0].status, MembershipStatus::Active);
        assert_eq!(rows[0].role, MemberRole::Organizer);
    }

    #[tokio::test]
    async fn test_membership_uniqueness() {
        let store = InMemoryStore::new();
        let group = store.create_group(7, fields()).await.unwrap();
        store
            .insert_membership(group.id, 8, MembershipState::Pending)
            .await
            .unwrap();
        let dup = store.insert_membership(group.id, 8, MembershipState::Pending).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
        assert_eq!(store.list_memberships(group.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_attendance_uniqueness() {
        let store = InMemoryStore::new();
        store.insert_attendance(3, 8, AttendanceStatus::Pending).await.unwrap();
        let dup = store.insert_attendance(3, 8, AttendanceStatus::Pending).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_state_writes_compare_and_set() {
        let store = InMemoryStore::new();
        let row = store.insert_attendance(3, 8, AttendanceStatus::Pending).await.unwrap();
        let accepted = store
            .set_attendance_status(row.id, AttendanceStatus::Pending, AttendanceStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, AttendanceStatus::Accepted);
        let stale = store
            .set_attendance_status(row.id, AttendanceStatus::Pending, AttendanceStatus::Rejected)
            .await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));
        assert_eq!(
            store.find_attendance(3, 8).await.unwrap().unwrap().status,
            AttendanceStatus::Accepted
        );

        let group = store.create_group(7, fields()).await.unwrap();
        let m = store
            .insert_membership(group.id, 8, MembershipState::Pending)
            .await
            .unwrap();
        let member = MembershipState::Active(MemberRole::Member);
        store
            .set_membership_state(m.id, MembershipState::Pending, member)
            .await
            .unwrap();
        let stale = store
            .set_membership_state(m.id, MembershipState::Pending, member)
            .await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_events_listed_by_start_date() {
        use chrono::{Duration, Utc};
        let store = InMemoryStore::new();
        let now = Utc::now();
        let event_at = |offset: i64| EventFields {
            venue_id: None,
            name: format!("Match {}", offset),
            kind: "In person".to_string(),
            capacity: 8,
            price: 5.0,
            description: "Friendly doubles".to_string(),
            start_date: now + Duration::days(offset),
            end_date: now + Duration::days(offset) + Duration::hours(2),
        };
        let late = store.insert_event(1, event_at(5)).await.unwrap();
        let early = store.insert_event(1, event_at(1)).await.unwrap();
        let ids: Vec<i64> = store.list_events(Some(1)).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[tokio::test]
    async fn test_delete_group_cascades() {
        let store = InMemoryStore::new();
        let group = store.create_group(7, fields()).await.unwrap();
        store
            .insert_image(NewImage::for_owner("a.png".into(), true, ImageOwner::Group(group.id)))
            .await
            .unwrap();
        store.delete_group(group.id).await.unwrap();
        assert!(store.find_group(group.id).await.unwrap().is_none());
        assert!(store.list_memberships(group.id).await.unwrap().is_empty());
        assert!(store.list_images(ImageOwner::Group(group.id)).await.unwrap().is_empty());
        assert!(store.groups_of_user(7).await.unwrap().is_empty());
    }
}
