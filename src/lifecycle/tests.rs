use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use super::LifecycleManager;
use crate::entity::event::{self, EventFields};
use crate::entity::event_attendance::AttendanceStatus;
use crate::entity::group::{self, GroupFields, Visibility};
use crate::entity::group_membership::{MemberRole, MembershipStatus};
use crate::entity::image::{ImageOwner, NewImage};
use crate::entity::user::NewUser;
use crate::entity::venue::VenueFields;
use crate::entity::UserId;
use crate::error::AppError;
use crate::membership::MembershipState;
use crate::store::{InMemoryStore, Store};

struct World {
    manager: LifecycleManager,
    store: Arc<dyn Store>,
}

impl World {
    fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        Self {
            manager: LifecycleManager::new(store.clone()),
            store,
        }
    }

    async fn user(&self, username: &str) -> UserId {
        self.store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                first_name: username.to_string(),
                last_name: "Tester".to_string(),
                hashed_password: "x".repeat(60),
            })
            .await
            .unwrap()
            .id
    }

    async fn group(&self, organizer: UserId) -> group::Model {
        self.manager
            .create_group(Some(organizer), group_fields())
            .await
            .unwrap()
    }

    async fn event(&self, organizer: UserId, group_id: i64) -> event::Model {
        self.manager
            .create_event(Some(organizer), group_id, event_fields(None))
            .await
            .unwrap()
    }

    /// request + approve as plain member
    async fn join(&self, organizer: UserId, user: UserId, group_id: i64) {
        self.manager.request_membership(Some(user), group_id).await.unwrap();
        self.manager
            .change_membership(
                Some(organizer),
                group_id,
                user,
                MembershipState::Active(MemberRole::Member),
            )
            .await
            .unwrap();
    }
}

fn group_fields() -> GroupFields {
    GroupFields {
        name: "Sunday Hikers".to_string(),
        about: "Easy trail walks every Sunday morning".to_string(),
        kind: "In person".to_string(),
        visibility: Visibility::Public,
        city: "Denver".to_string(),
        state: "CO".to_string(),
    }
}

fn venue_fields() -> VenueFields {
    VenueFields {
        address: "100 Trailhead Rd".to_string(),
        city: "Denver".to_string(),
        state: "CO".to_string(),
        lat: 39.7392,
        lng: -104.9903,
    }
}

fn event_fields(venue_id: Option<i64>) -> EventFields {
    EventFields {
        venue_id,
        name: "Red Rocks loop".to_string(),
        kind: "In person".to_string(),
        capacity: 20,
        price: 0.0,
        description: "Six miles, bring water".to_string(),
        start_date: Utc.with_ymd_and_hms(2026, 11, 1, 8, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2026, 11, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_group_creation_records_single_organizer() {
    let w = World::new();
    let alice = w.user("alice").await;
    let g = w.group(alice).await;
    assert_eq!(g.organizer_id, alice);

    let rows = w.store.list_memberships(g.id).await.unwrap();
    let organizers: Vec<_> = rows
        .iter()
        .filter(|m| m.status == MembershipStatus::Active && m.role == MemberRole::Organizer)
        .collect();
    assert_eq!(organizers.len(), 1);
    assert_eq!(organizers[0].user_id, g.organizer_id);
}

#[tokio::test]
async fn test_anonymous_cannot_create_group() {
    let w = World::new();
    let err = w.manager.create_group(None, group_fields()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated));
    assert!(w.manager.list_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_membership_request_conflicts() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let g = w.group(alice).await;

    assert_ok!(w.manager.request_membership(Some(bob), g.id).await);
    let err = w.manager.request_membership(Some(bob), g.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let rows = w.store.list_memberships(g.id).await.unwrap();
    assert_eq!(rows.iter().filter(|m| m.user_id == bob).count(), 1);

    // organizer is already related to the group
    let err = w.manager.request_membership(Some(alice), g.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_pending_cannot_jump_to_cohost() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let g = w.group(alice).await;
    w.manager.request_membership(Some(bob), g.id).await.unwrap();

    let err = w
        .manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let member = w
        .manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Active(MemberRole::Member))
        .await
        .unwrap();
    assert_eq!(member.status, MembershipStatus::Active);
    assert_eq!(member.role, MemberRole::Member);

    let cohost = w
        .manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();
    assert_eq!(cohost.role, MemberRole::CoHost);

    let err = w
        .manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_only_organizer_grants_cohost() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.join(alice, carol, g.id).await;
    w.manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();

    // co-host may approve but not promote
    let err = w
        .manager
        .change_membership(Some(bob), g.id, carol, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let dave = w.user("dave").await;
    w.manager.request_membership(Some(dave), g.id).await.unwrap();
    assert_ok!(
        w.manager
            .change_membership(Some(bob), g.id, dave, MembershipState::Active(MemberRole::Member))
            .await
    );

    // plain member cannot approve
    let erin = w.user("erin").await;
    w.manager.request_membership(Some(erin), g.id).await.unwrap();
    let err = w
        .manager
        .change_membership(Some(carol), g.id, erin, MembershipState::Active(MemberRole::Member))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_member_removal_rules() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.join(alice, carol, g.id).await;

    let err = w.manager.remove_membership(Some(bob), g.id, carol).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    assert_ok!(w.manager.remove_membership(Some(bob), g.id, bob).await);
    assert_ok!(w.manager.remove_membership(Some(alice), g.id, carol).await);

    let err = w.manager.remove_membership(Some(alice), g.id, alice).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(w.store.find_membership(g.id, alice).await.unwrap().is_some());

    let err = w.manager.remove_membership(Some(alice), g.id, bob).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_member_cannot_manage_venues_or_events_but_can_add_images() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    let venue = w.manager.create_venue(Some(alice), g.id, venue_fields()).await.unwrap();
    let event = w.event(alice, g.id).await;

    let err = w.manager.create_venue(Some(bob), g.id, venue_fields()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = w.manager.update_venue(Some(bob), venue.id, venue_fields()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = w.manager.create_event(Some(bob), g.id, event_fields(None)).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = w.manager.update_event(Some(bob), event.id, event_fields(None)).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = w.manager.delete_event(Some(bob), event.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    for owner in [ImageOwner::Group(g.id), ImageOwner::Event(event.id), ImageOwner::Venue(venue.id)] {
        let img = NewImage::for_owner("https://img.example.com/a.png".into(), false, owner);
        assert_ok!(w.manager.create_image(Some(bob), img).await);
        assert_eq!(w.manager.list_images(owner).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_cohost_manages_events_not_venues() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();

    let event = w.event(bob, g.id).await;
    assert_ok!(w.manager.update_event(Some(bob), event.id, event_fields(None)).await);
    let err = w.manager.create_venue(Some(bob), g.id, venue_fields()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_ok!(w.manager.delete_event(Some(bob), event.id).await);
}

#[tokio::test]
async fn test_not_found_before_authorization() {
    let w = World::new();
    let alice = w.user("alice").await;
    let mallory = w.user("mallory").await;
    let g = w.group(alice).await;

    let err = w.manager.delete_event(Some(mallory), 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = w.manager.create_venue(Some(mallory), 9999, venue_fields()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = w.manager.delete_group(Some(mallory), g.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_event_venue_must_belong_to_group() {
    let w = World::new();
    let alice = w.user("alice").await;
    let g1 = w.group(alice).await;
    let g2 = w.group(alice).await;
    let other_venue = w.manager.create_venue(Some(alice), g2.id, venue_fields()).await.unwrap();
    let own_venue = w.manager.create_venue(Some(alice), g1.id, venue_fields()).await.unwrap();

    let err = w
        .manager
        .create_event(Some(alice), g1.id, event_fields(Some(other_venue.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let event = w
        .manager
        .create_event(Some(alice), g1.id, event_fields(Some(own_venue.id)))
        .await
        .unwrap();
    assert_eq!(event.venue_id, Some(own_venue.id));
}

#[tokio::test]
async fn test_attendee_listing_visibility() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.join(alice, carol, g.id).await;
    let event = w.event(alice, g.id).await;

    w.manager.request_attendance(Some(bob), event.id).await.unwrap();
    w.manager.request_attendance(Some(carol), event.id).await.unwrap();
    w.manager
        .decide_attendance(Some(alice), event.id, carol, AttendanceStatus::Accepted)
        .await
        .unwrap();

    let as_member = w.manager.list_attendees(Some(bob), event.id).await.unwrap();
    assert_eq!(as_member.len(), 1);
    assert!(as_member.iter().all(|a| a.attendance.status != AttendanceStatus::Pending));

    let anonymous = w.manager.list_attendees(None, event.id).await.unwrap();
    assert_eq!(anonymous.len(), 1);

    let as_organizer = w.manager.list_attendees(Some(alice), event.id).await.unwrap();
    assert_eq!(as_organizer.len(), 2);
    assert!(as_organizer
        .iter()
        .any(|a| a.user.id == bob && a.attendance.status == AttendanceStatus::Pending));
}

#[tokio::test]
async fn test_member_listing_hides_pending_from_members() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.manager.request_membership(Some(carol), g.id).await.unwrap();

    assert_eq!(w.manager.list_members(Some(bob), g.id).await.unwrap().len(), 2);
    assert_eq!(w.manager.list_members(Some(alice), g.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_attendance_request_rules() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.manager.request_membership(Some(carol), g.id).await.unwrap();
    let event = w.event(alice, g.id).await;

    // pending member may not attend yet
    let err = w.manager.request_attendance(Some(carol), event.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    w.manager.request_attendance(Some(bob), event.id).await.unwrap();
    let err = w.manager.request_attendance(Some(bob), event.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // plain member cannot decide, pending target refused, decisions terminal
    let err = w
        .manager
        .decide_attendance(Some(bob), event.id, bob, AttendanceStatus::Accepted)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = w
        .manager
        .decide_attendance(Some(alice), event.id, bob, AttendanceStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    w.manager
        .decide_attendance(Some(alice), event.id, bob, AttendanceStatus::Rejected)
        .await
        .unwrap();
    assert_err!(
        w.manager
            .decide_attendance(Some(alice), event.id, bob, AttendanceStatus::Accepted)
            .await
    );

    // rejected is not re-applicable
    let err = w.manager.request_attendance(Some(bob), event.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_attendance_removal_rules() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let carol = w.user("carol").await;
    let dave = w.user("dave").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.join(alice, carol, g.id).await;
    w.join(alice, dave, g.id).await;
    w.manager
        .change_membership(Some(alice), g.id, dave, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();
    let event = w.event(alice, g.id).await;
    w.manager.request_attendance(Some(bob), event.id).await.unwrap();
    w.manager.request_attendance(Some(carol), event.id).await.unwrap();

    let err = w.manager.remove_attendance(Some(carol), event.id, bob).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let err = w.manager.remove_attendance(Some(dave), event.id, bob).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    assert_ok!(w.manager.remove_attendance(Some(alice), event.id, bob).await);
    assert_ok!(w.manager.remove_attendance(Some(carol), event.id, carol).await);
    assert!(w.store.list_attendances(event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_full_membership_and_attendance_scenario() {
    let w = World::new();
    let a = w.user("alice").await;
    let b = w.user("bob").await;

    let g = w.group(a).await;
    let pending = w.manager.request_membership(Some(b), g.id).await.unwrap();
    assert_eq!(pending.status, MembershipStatus::Pending);
    w.manager
        .change_membership(Some(a), g.id, b, MembershipState::Active(MemberRole::Member))
        .await
        .unwrap();

    let e = w.event(a, g.id).await;
    let requested = w.manager.request_attendance(Some(b), e.id).await.unwrap();
    assert_eq!(requested.status, AttendanceStatus::Pending);
    let accepted = w
        .manager
        .decide_attendance(Some(a), e.id, b, AttendanceStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(accepted.status, AttendanceStatus::Accepted);

    assert_ok!(w.manager.remove_attendance(Some(b), e.id, b).await);
    assert!(w.store.find_attendance(e.id, b).await.unwrap().is_none());

    let err = w.manager.delete_event(Some(b), e.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert!(w.store.find_event(e.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_image_with_two_owners_rejected() {
    let w = World::new();
    let alice = w.user("alice").await;
    let g = w.group(alice).await;
    let venue = w.manager.create_venue(Some(alice), g.id, venue_fields()).await.unwrap();
    let event = w.event(alice, g.id).await;

    let img = NewImage {
        url: "https://img.example.com/b.png".to_string(),
        preview: true,
        group_id: None,
        event_id: Some(event.id),
        venue_id: Some(venue.id),
    };
    let err = w.manager.create_image(Some(alice), img).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(w.manager.list_images(ImageOwner::Event(event.id)).await.unwrap().is_empty());
    assert!(w.manager.list_images(ImageOwner::Venue(venue.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_group_update_and_delete_by_organizer_only() {
    let w = World::new();
    let alice = w.user("alice").await;
    let bob = w.user("bob").await;
    let g = w.group(alice).await;
    w.join(alice, bob, g.id).await;
    w.manager
        .change_membership(Some(alice), g.id, bob, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();

    let mut fields = group_fields();
    fields.name = "Saturday Hikers".to_string();
    let err = w.manager.update_group(Some(bob), g.id, fields.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let updated = w.manager.update_group(Some(alice), g.id, fields).await.unwrap();
    assert_eq!(updated.name, "Saturday Hikers");
    assert_eq!(updated.organizer_id, alice);

    let err = w.manager.delete_group(Some(bob), g.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_ok!(w.manager.delete_group(Some(alice), g.id).await);
    let err = w.manager.get_group(g.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(w.manager.groups_of_caller(Some(bob)).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_attendance_decisions_settle_once() {
    let w = World::new();
    let alice = w.user("alice").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, carol, g.id).await;
    w.manager
        .change_membership(Some(alice), g.id, carol, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();

    for round in 0..50 {
        let bob = w.user(&format!("bob{}", round)).await;
        w.join(alice, bob, g.id).await;
        let e = w.event(alice, g.id).await;
        w.manager.request_attendance(Some(bob), e.id).await.unwrap();

        let accept = {
            let manager = w.manager.clone();
            tokio::spawn(async move {
                manager
                    .decide_attendance(Some(alice), e.id, bob, AttendanceStatus::Accepted)
                    .await
            })
        };
        let reject = {
            let manager = w.manager.clone();
            tokio::spawn(async move {
                manager
                    .decide_attendance(Some(carol), e.id, bob, AttendanceStatus::Rejected)
                    .await
            })
        };
        let accept = accept.await.unwrap();
        let reject = reject.await.unwrap();

        assert!(accept.is_ok() != reject.is_ok(), "exactly one decision must win");
        let loser = if accept.is_ok() { &reject } else { &accept };
        assert!(matches!(loser, Err(AppError::Conflict(_))));

        let winner = if accept.is_ok() {
            AttendanceStatus::Accepted
        } else {
            AttendanceStatus::Rejected
        };
        let stored = w.store.find_attendance(e.id, bob).await.unwrap().unwrap();
        assert_eq!(stored.status, winner);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_membership_approvals_settle_once() {
    let w = World::new();
    let alice = w.user("alice").await;
    let carol = w.user("carol").await;
    let g = w.group(alice).await;
    w.join(alice, carol, g.id).await;
    w.manager
        .change_membership(Some(alice), g.id, carol, MembershipState::Active(MemberRole::CoHost))
        .await
        .unwrap();

    for round in 0..50 {
        let bob = w.user(&format!("bob{}", round)).await;
        w.manager.request_membership(Some(bob), g.id).await.unwrap();

        let approvals: Vec<_> = [alice, carol]
            .into_iter()
            .map(|approver| {
                let manager = w.manager.clone();
                tokio::spawn(async move {
                    manager
                        .change_membership(
                            Some(approver),
                            g.id,
                            bob,
                            MembershipState::Active(MemberRole::Member),
                        )
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for handle in approvals {
            match handle.await.unwrap() {
                Ok(row) => {
                    wins += 1;
                    assert_eq!(row.status, MembershipStatus::Active);
                }
                Err(err) => assert!(matches!(err, AppError::Conflict(_))),
            }
        }
        assert_eq!(wins, 1);
    }
}
