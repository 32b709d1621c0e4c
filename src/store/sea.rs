//! SeaORM entity store (PostgreSQL)

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionError, TransactionTrait,
};

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

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Unique-constraint violations become conflicts, everything else stays a DB error
fn unique_or_db(err: DbErr, conflict: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict(conflict),
        _ => AppError::Database(err),
    }
}

fn tx_err(err: TransactionError<DbErr>) -> AppError {
    match err {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => AppError::Database(e),
    }
}

fn image_owner_condition(owner: ImageOwner) -> Condition {
    match owner {
        ImageOwner::Group(id) => Condition::all()
            .add(image::Column::GroupId.eq(id))
            .add(image::Column::EventId.is_null())
            .add(image::Column::VenueId.is_null()),
        ImageOwner::Event(id) => Condition::all().add(image::Column::EventId.eq(id)),
        ImageOwner::Venue(id) => Condition::all().add(image::Column::VenueId.eq(id)),
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn find_user(&self, id: UserId) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_user_by_credential(&self, credential: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(credential))
                    .add(user::Column::Email.eq(credential)),
            )
            .one(&self.db)
            .await?)
    }

    async fn find_users(&self, ids: &[UserId]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(user::Entity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?)
    }

    async fn insert_user(&self, new: NewUser) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(new.username),
            email: Set(new.email),
            first_name: Set(new.first_name),
            last_name: Set(new.last_name),
            hashed_password: Set(new.hashed_password),
            ..Default::default()
        };
        model
            .insert(&self.db)
            .await
            .map_err(|e| unique_or_db(e, "User with that username or email already exists"))
    }

    async fn list_groups(&self) -> AppResult<Vec<group::Model>> {
        Ok(group::Entity::find()
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn groups_of_user(&self, user_id: UserId) -> AppResult<Vec<group::Model>> {
        let group_ids: Vec<i64> = group_membership::Entity::find()
            .filter(group_membership::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.group_id)
            .collect();

        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn find_group(&self, id: i64) -> AppResult<Option<group::Model>> {
        Ok(group::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn create_group(&self, organizer_id: UserId, fields: GroupFields) -> AppResult<group::Model> {
        // Group and organizer membership in one transaction
        self.db
            .transaction::<_, group::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let new_group = group::ActiveModel {
                        organizer_id: Set(organizer_id),
                        name: Set(fields.name),
                        about: Set(fields.about),
                        kind: Set(fields.kind),
                        visibility: Set(fields.visibility),
                        city: Set(fields.city),
                        state: Set(fields.state),
                        ..Default::default()
                    };
                    let group = new_group.insert(txn).await?;

                    let (status, role) = MembershipState::Active(MemberRole::Organizer).columns();
                    let organizer = group_membership::ActiveModel {
                        group_id: Set(group.id),
                        user_id: Set(organizer_id),
                        status: Set(status),
                        role: Set(role),
                        ..Default::default()
                    };
                    organizer.insert(txn).await?;

                    Ok(group)
                })
            })
            .await
            .map_err(tx_err)
    }

    async fn update_group(&self, id: i64, fields: GroupFields) -> AppResult<group::Model> {
        let existing = group::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Group couldn't be found")?;

        let mut active: group::ActiveModel = existing.into();
        active.name = Set(fields.name);
        active.about = Set(fields.about);
        active.kind = Set(fields.kind);
        active.visibility = Set(fields.visibility);
        active.city = Set(fields.city);
        active.state = Set(fields.state);
        Ok(active.update(&self.db).await?)
    }

    async fn delete_group(&self, id: i64) -> AppResult<()> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    let event_ids: Vec<i64> = event::Entity::find()
                        .filter(event::Column::GroupId.eq(id))
                        .all(txn)
                        .await?
                        .into_iter()
                        .map(|e| e.id)
                        .collect();
                    let venue_ids: Vec<i64> = venue::Entity::find()
                        .filter(venue::Column::GroupId.eq(id))
                        .all(txn)
                        .await?
                        .into_iter()
                        .map(|v| v.id)
                        .collect();

                    // Images of the group, its events and its venues
                    image::Entity::delete_many()
                        .filter(
                            Condition::any()
                                .add(image::Column::GroupId.eq(id))
                                .add(image::Column::EventId.is_in(event_ids.clone()))
                                .add(image::Column::VenueId.is_in(venue_ids)),
                        )
                        .exec(txn)
                        .await?;

                    event_attendance::Entity::delete_many()
                        .filter(event_attendance::Column::EventId.is_in(event_ids))
                        .exec(txn)
                        .await?;

                    event::Entity::delete_many()
                        .filter(event::Column::GroupId.eq(id))
                        .exec(txn)
                        .await?;

                    venue::Entity::delete_many()
                        .filter(venue::Column::GroupId.eq(id))
                        .exec(txn)
                        .await?;

                    group_membership::Entity::delete_many()
                        .filter(group_membership::Column::GroupId.eq(id))
                        .exec(txn)
                        .await?;

                    group::Entity::delete_by_id(id).exec(txn).await?;

                    Ok(())
                })
            })
            .await
            .map_err(tx_err)
    }

    async fn find_membership(
        &self,
        group_id: i64,
        user_id: UserId,
    ) -> AppResult<Option<group_membership::Model>> {
        Ok(group_membership::Entity::find()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .filter(group_membership::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    async fn list_memberships(&self, group_id: i64) -> AppResult<Vec<group_membership::Model>> {
        Ok(group_membership::Entity::find()
            .filter(group_membership::Column::GroupId.eq(group_id))
            .order_by_asc(group_membership::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn insert_membership(
        &self,
        group_id: i64,
        user_id: UserId,
        state: MembershipState,
    ) -> AppResult<group_membership::Model> {
        let (status, role) = state.columns();
        let model = group_membership::ActiveModel {
            group_id: Set(group_id),
            user_id: Set(user_id),
            status: Set(status),
            role: Set(role),
            ..Default::default()
        };
        model
            .insert(&self.db)
            .await
            .map_err(|e| unique_or_db(e, "Membership already exists"))
    }

    async fn set_membership_state(
        &self,
        id: i64,
        from: MembershipState,
        to: MembershipState,
    ) -> AppResult<group_membership::Model> {
        let (from_status, from_role) = from.columns();
        let (status, role) = to.columns();
        let result = group_membership::Entity::update_many()
            .set(group_membership::ActiveModel {
                status: Set(status),
                role: Set(role),
                ..Default::default()
            })
            .filter(group_membership::Column::Id.eq(id))
            .filter(group_membership::Column::Status.eq(from_status))
            .filter(group_membership::Column::Role.eq(from_role))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::conflict("Membership was changed by another request"));
        }

        group_membership::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Membership couldn't be found")
    }

    async fn delete_membership(&self, id: i64) -> AppResult<()> {
        group_membership::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn list_venues(&self, group_id: Option<i64>) -> AppResult<Vec<venue::Model>> {
        let mut query = venue::Entity::find();
        if let Some(group_id) = group_id {
            query = query.filter(venue::Column::GroupId.eq(group_id));
        }
        Ok(query.order_by_asc(venue::Column::Id).all(&self.db).await?)
    }

    async fn find_venue(&self, id: i64) -> AppResult<Option<venue::Model>> {
        Ok(venue::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn insert_venue(&self, group_id: i64, fields: VenueFields) -> AppResult<venue::Model> {
        let model = venue::ActiveModel {
            group_id: Set(group_id),
            address: Set(fields.address),
            city: Set(fields.city),
            state: Set(fields.state),
            lat: Set(fields.lat),
            lng: Set(fields.lng),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn update_venue(&self, id: i64, fields: VenueFields) -> AppResult<venue::Model> {
        let existing = venue::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Venue couldn't be found")?;

        let mut active: venue::ActiveModel = existing.into();
        active.address = Set(fields.address);
        active.city = Set(fields.city);
        active.state = Set(fields.state);
        active.lat = Set(fields.lat);
        active.lng = Set(fields.lng);
        Ok(active.update(&self.db).await?)
    }

    async fn list_events(&self, group_id: Option<i64>) -> AppResult<Vec<event::Model>> {
        let mut query = event::Entity::find();
        if let Some(group_id) = group_id {
            query = query.filter(event::Column::GroupId.eq(group_id));
        }
        Ok(query.order_by_asc(event::Column::StartDate).all(&self.db).await?)
    }

    async fn find_event(&self, id: i64) -> AppResult<Option<event::Model>> {
        Ok(event::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn insert_event(&self, group_id: i64, fields: EventFields) -> AppResult<event::Model> {
        let model = event::ActiveModel {
            group_id: Set(group_id),
            venue_id: Set(fields.venue_id),
            name: Set(fields.name),
            kind: Set(fields.kind),
            capacity: Set(fields.capacity),
            price: Set(fields.price),
            description: Set(fields.description),
            start_date: Set(fields.start_date),
            end_date: Set(fields.end_date),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn update_event(&self, id: i64, fields: EventFields) -> AppResult<event::Model> {
        let existing = event::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Event couldn't be found")?;

        let mut active: event::ActiveModel = existing.into();
        active.venue_id = Set(fields.venue_id);
        active.name = Set(fields.name);
        active.kind = Set(fields.kind);
        active.capacity = Set(fields.capacity);
        active.price = Set(fields.price);
        active.description = Set(fields.description);
        active.start_date = Set(fields.start_date);
        active.end_date = Set(fields.end_date);
        Ok(active.update(&self.db).await?)
    }

    async fn delete_event(&self, id: i64) -> AppResult<()> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    event_attendance::Entity::delete_many()
                        .filter(event_attendance::Column::EventId.eq(id))
                        .exec(txn)
                        .await?;

                    image::Entity::delete_many()
                        .filter(image::Column::EventId.eq(id))
                        .exec(txn)
                        .await?;

                    event::Entity::delete_by_id(id).exec(txn).await?;

                    Ok(())
                })
            })
            .await
            .map_err(tx_err)
    }

    async fn find_attendance(
        &self,
        event_id: i64,
        user_id: UserId,
    ) -> AppResult<Option<event_attendance::Model>> {
        Ok(event_attendance::Entity::find()
            .filter(event_attendance::Column::EventId.eq(event_id))
            .filter(event_attendance::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    async fn list_attendances(&self, event_id: i64) -> AppResult<Vec<event_attendance::Model>> {
        Ok(event_attendance::Entity::find()
            .filter(event_attendance::Column::EventId.eq(event_id))
            .order_by_asc(event_attendance::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn insert_attendance(
        &self,
        event_id: i64,
        user_id: UserId,
        status: AttendanceStatus,
    ) -> AppResult<event_attendance::Model> {
        let model = event_attendance::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            status: Set(status),
            ..Default::default()
        };
        model
            .insert(&self.db)
            .await
            .map_err(|e| unique_or_db(e, "Attendance already exists"))
    }

    async fn set_attendance_status(
        &self,
        id: i64,
        from: AttendanceStatus,
        to: AttendanceStatus,
    ) -> AppResult<event_attendance::Model> {
        let result = event_attendance::Entity::update_many()
            .set(event_attendance::ActiveModel {
                status: Set(to),
                ..Default::default()
            })
            .filter(event_attendance::Column::Id.eq(id))
            .filter(event_attendance::Column::Status.eq(from))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::conflict("Attendance was changed by another request"));
        }

        event_attendance::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Attendance couldn't be found")
    }

    async fn delete_attendance(&self, id: i64) -> AppResult<()> {
        event_attendance::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    async fn insert_image(&self, new: NewImage) -> AppResult<image::Model> {
        let (group_id, event_id, venue_id) = new.owner()?.refs();
        let model = image::ActiveModel {
            url: Set(new.url),
            preview: Set(new.preview),
            group_id: Set(group_id),
            event_id: Set(event_id),
            venue_id: Set(venue_id),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn list_images(&self, owner: ImageOwner) -> AppResult<Vec<image::Model>> {
        Ok(image::Entity::find()
            .filter(image_owner_condition(owner))
            .order_by_asc(image::Column::Id)
            .all(&self.db)
            .await?)
    }
}
