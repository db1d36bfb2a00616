//! End-to-end session lifecycle, discovery, inbox and safety flows.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use common::{nearby, origin, too_far, Harness};
use uuid::Uuid;
use vibe_core::clock::Clock;
use vibe_core::error::CoreError;
use vibe_core::geo::{self, Coordinates};
use vibe_core::notification::{titles, NotificationKind};
use vibe_core::session::{ArrivalOutcome, SessionStatus};
use vibe_core::store::{ProfileStore, SafetyAlertStore, SessionStore};
use vibe_engine::{CreateVibe, ALL_ACTIVITIES};
use vibe_events::event_types;

#[tokio::test]
async fn full_meetup_from_creation_to_completion() {
    let h = Harness::new();
    let creator = h.user("alice", None).await;
    let joiner = h.user("bob", None).await;

    let session = h.open_vibe(creator, origin()).await;
    assert_eq!(session.status, SessionStatus::Open);
    assert_eq!(session.expires_at, session.created_at + Duration::minutes(15));

    h.clock.advance(Duration::minutes(3));
    let joined = h
        .engine
        .matchmaking
        .join(Some(joiner), session.id, Some(nearby()))
        .await
        .unwrap();
    assert_eq!(joined.session.status, SessionStatus::Matched);
    assert_eq!(joined.session.participant_id, Some(joiner));
    assert_eq!(joined.session.participant_name.as_deref(), Some("bob"));

    let presence = &h.engine.presence;
    presence.set_present(session.id, creator, true).await.unwrap();
    h.clock.advance(Duration::minutes(2));
    let started = presence.set_present(session.id, joiner, true).await.unwrap();
    let handshake_at = h.clock.now();
    assert!(started.outcome.handshake);
    assert!(started.session.session_started);
    assert_eq!(started.session.expires_at, handshake_at + Duration::minutes(15));

    let first = h.engine.arrivals.log_arrival(session.id, creator).await.unwrap();
    assert_eq!(first.outcome, ArrivalOutcome::Logged { completed: false });
    assert_eq!(first.session.status, SessionStatus::Matched);
    assert_eq!(h.trust(creator).await, 1);

    let second = h.engine.arrivals.log_arrival(session.id, joiner).await.unwrap();
    assert_eq!(second.outcome, ArrivalOutcome::Logged { completed: true });
    assert_eq!(second.session.status, SessionStatus::Completed);
    assert_eq!(h.trust(joiner).await, 1);

    // The creator was told about the join.
    assert_eq!(h.wait_for_unread(creator, 1).await, 1);
    let inbox = h.engine.inbox.list(creator, false, 10).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].title, titles::CONNECTION_MADE);
    assert_eq!(inbox[0].kind, NotificationKind::Match);
    assert_eq!(inbox[0].session_id, Some(session.id));

    // Both walk away; the last one out reclaims the record.
    assert!(!presence.leave(session.id, joiner).await.unwrap());
    assert!(presence.leave(session.id, creator).await.unwrap());
    assert!(SessionStore::get(&*h.store, session.id).await.unwrap().is_none());
    assert_eq!(h.engine.inbox.unread_count(creator).await.unwrap(), 0);
}

#[tokio::test]
async fn expired_sessions_vanish_and_are_reclaimed_by_the_next_create() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let viewer = h.user("viewer", Some(nearby())).await;

    let stale = h.open_vibe(creator, origin()).await;
    let feed = h.engine.feed.list(viewer, Some(nearby()), None).await.unwrap();
    assert_eq!(feed.len(), 1);

    h.clock.advance(Duration::minutes(16));
    let feed = h.engine.feed.list(viewer, Some(nearby()), None).await.unwrap();
    assert!(feed.is_empty());
    let buckets = geo::search_buckets(&origin(), 6);
    assert!(h
        .store
        .list_open_in_buckets(&buckets, h.clock.now(), 50)
        .await
        .unwrap()
        .is_empty());
    assert_matches!(
        h.engine
            .matchmaking
            .join(Some(viewer), stale.id, Some(nearby()))
            .await,
        Err(CoreError::NotFound)
    );

    // Still stored until the owner's next create sweeps it.
    assert_eq!(h.store.session_count().await, 1);
    let fresh = h.open_vibe(creator, origin()).await;
    assert_eq!(h.store.session_count().await, 1);
    assert!(SessionStore::get(&*h.store, stale.id).await.unwrap().is_none());
    assert!(SessionStore::get(&*h.store, fresh.id).await.unwrap().is_some());
}

#[tokio::test]
async fn janitor_only_touches_the_sweeping_user() {
    let h = Harness::new();
    let alice = h.user("alice", None).await;
    let bob = h.user("bob", None).await;

    let alices = h.open_vibe(alice, origin()).await;
    let bobs = h.open_vibe(bob, too_far()).await;
    h.clock.advance(Duration::minutes(30));

    let report = h.engine.janitor.sweep_for(alice).await.unwrap();
    assert_eq!(report.sessions_removed, 1);
    assert!(SessionStore::get(&*h.store, alices.id).await.unwrap().is_none());
    assert!(SessionStore::get(&*h.store, bobs.id).await.unwrap().is_some());
}

#[tokio::test]
async fn janitor_drops_expired_notifications() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let joiner = h.user("joiner", None).await;
    let session = h.open_vibe(creator, origin()).await;
    h.engine
        .matchmaking
        .join(Some(joiner), session.id, Some(nearby()))
        .await
        .unwrap();
    assert_eq!(h.wait_for_unread(creator, 1).await, 1);

    h.clock.advance(Duration::hours(25));
    // Expired notifications are hidden before they are deleted.
    assert_eq!(h.engine.inbox.unread_count(creator).await.unwrap(), 0);
    assert_eq!(h.store.notification_count().await, 1);

    let report = h.engine.janitor.sweep_for(creator).await.unwrap();
    assert_eq!(report.sessions_removed, 1);
    assert_eq!(report.notifications_removed, 1);
    assert_eq!(h.store.notification_count().await, 0);
}

#[tokio::test]
async fn feed_lists_nearby_vibes_redacted_with_distance() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let viewer = h.user("viewer", Some(nearby())).await;
    let session = h.open_vibe(creator, origin()).await;
    h.clock.advance(Duration::minutes(5));

    let feed = h.engine.feed.list(viewer, Some(nearby()), None).await.unwrap();
    assert_eq!(feed.len(), 1);
    let entry = &feed[0];
    assert_eq!(entry.session.id, session.id);
    assert!(!entry.is_mine);
    assert!(entry.session.secure_key.is_empty());
    assert_eq!(entry.distance_label.as_deref(), Some("445m away"));
    assert_eq!(entry.remaining_mins, 10);

    // The creator sees their own session with the key.
    let own = h.engine.feed.list(creator, Some(origin()), None).await.unwrap();
    assert_eq!(own.len(), 1);
    assert!(own[0].is_mine);
    assert_eq!(own[0].session.secure_key, session.secure_key);
    assert_eq!(own[0].distance_label.as_deref(), Some("0m away"));
}

#[tokio::test]
async fn feed_hides_distant_and_matched_vibes() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let joiner = h.user("joiner", None).await;
    let viewer = h.user("viewer", None).await;

    h.open_vibe(creator, too_far()).await;
    let matched = h.open_vibe(joiner, origin()).await;
    let other = h.user("other", None).await;
    h.engine
        .matchmaking
        .join(Some(other), matched.id, Some(nearby()))
        .await
        .unwrap();

    let feed = h.engine.feed.list(viewer, Some(origin()), None).await.unwrap();
    assert!(feed.is_empty());

    // The participant still sees the matched session as their own.
    let feed = h.engine.feed.list(other, Some(nearby()), None).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert!(feed[0].is_mine);
    assert_eq!(feed[0].session.id, matched.id);
}

#[tokio::test]
async fn feed_without_location_shows_only_own_sessions() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let viewer = h.user("viewer", None).await;
    h.open_vibe(creator, origin()).await;
    let mine = h.open_vibe(viewer, nearby()).await;

    let feed = h.engine.feed.list(viewer, None, None).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].session.id, mine.id);
    assert_eq!(feed[0].distance_km, None);
}

#[tokio::test]
async fn feed_respects_blocks_in_both_directions() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let viewer = h.user("viewer", None).await;
    let bystander = h.user("bystander", None).await;
    h.open_vibe(creator, origin()).await;

    h.engine.safety.block(creator, viewer).await.unwrap();
    assert!(h.engine.feed.list(viewer, Some(nearby()), None).await.unwrap().is_empty());
    assert_eq!(
        h.engine.feed.list(bystander, Some(nearby()), None).await.unwrap().len(),
        1
    );

    h.engine.safety.block(bystander, creator).await.unwrap();
    assert!(h
        .engine
        .feed
        .list(bystander, Some(nearby()), None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn feed_applies_trust_gates() {
    let h = Harness::new();
    let shady = h.user("shady", None).await;
    let honest = h.user("honest", None).await;
    let viewer = h.user("viewer", None).await;

    let mut profile = h.profile(shady).await;
    profile.trust_points = -3;
    h.store.upsert(&profile).await.unwrap();

    h.open_vibe(shady, origin()).await;
    let visible = h.open_vibe(honest, origin()).await;

    let feed = h.engine.feed.list(viewer, Some(nearby()), None).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].session.id, visible.id);

    // A viewer in bad standing only sees their own sessions.
    let own = h.engine.feed.list(shady, Some(nearby()), None).await.unwrap();
    assert_eq!(own.len(), 1);
    assert!(own[0].is_mine);
}

#[tokio::test]
async fn feed_filters_by_activity() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let viewer = h.user("viewer", None).await;
    h.open_vibe(creator, origin()).await;
    h.engine
        .matchmaking
        .create(
            Some(creator),
            CreateVibe {
                activity_type: Some("Study".into()),
                ..Default::default()
            },
            Some(origin()),
        )
        .await
        .unwrap();

    let feed = &h.engine.feed;
    assert_eq!(feed.list(viewer, Some(nearby()), None).await.unwrap().len(), 2);
    assert_eq!(
        feed.list(viewer, Some(nearby()), Some(ALL_ACTIVITIES)).await.unwrap().len(),
        2
    );
    let study = feed.list(viewer, Some(nearby()), Some("Study")).await.unwrap();
    assert_eq!(study.len(), 1);
    assert_eq!(study[0].session.activity_type, "Study");
    assert!(feed.list(viewer, Some(nearby()), Some("Gym")).await.unwrap().is_empty());
}

#[tokio::test]
async fn feed_is_newest_first() {
    let h = Harness::new();
    let a = h.user("a", None).await;
    let b = h.user("b", None).await;
    let viewer = h.user("viewer", None).await;

    let older = h.open_vibe(a, origin()).await;
    h.clock.advance(Duration::minutes(1));
    let newer = h.open_vibe(b, origin()).await;

    let feed = h.engine.feed.list(viewer, Some(nearby()), None).await.unwrap();
    let ids: Vec<_> = feed.iter().map(|e| e.session.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn feed_requires_a_profile() {
    let h = Harness::new();
    assert_matches!(
        h.engine.feed.list(Uuid::new_v4(), Some(origin()), None).await,
        Err(CoreError::ProfileNotFound)
    );
}

#[tokio::test]
async fn inbox_read_and_purge() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let first = h.user("first", None).await;
    let second = h.user("second", None).await;

    let a = h.open_vibe(creator, origin()).await;
    h.engine.matchmaking.join(Some(first), a.id, Some(nearby())).await.unwrap();
    let b = h.open_vibe(creator, origin()).await;
    h.engine.matchmaking.join(Some(second), b.id, Some(nearby())).await.unwrap();
    assert_eq!(h.wait_for_unread(creator, 2).await, 2);

    let inbox = &h.engine.inbox;
    assert_eq!(inbox.list(creator, true, 50).await.unwrap().len(), 2);
    assert_eq!(inbox.list(creator, false, 1).await.unwrap().len(), 1);

    assert_eq!(inbox.mark_all_read(creator).await.unwrap(), 2);
    assert_eq!(inbox.unread_count(creator).await.unwrap(), 0);
    assert!(inbox.list(creator, true, 50).await.unwrap().is_empty());
    assert_eq!(inbox.list(creator, false, 50).await.unwrap().len(), 2);

    assert_eq!(inbox.purge(creator).await.unwrap(), 2);
    assert!(inbox.list(creator, false, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn block_is_idempotent_and_rejects_self() {
    let h = Harness::new();
    let user = h.user("user", None).await;
    let other = h.user("other", None).await;
    let safety = &h.engine.safety;

    assert!(safety.block(user, other).await.unwrap());
    assert!(!safety.block(user, other).await.unwrap());
    assert!(h.profile(user).await.has_blocked(other));

    assert_matches!(safety.block(user, user).await, Err(CoreError::Validation(_)));
    assert_matches!(
        safety.block(Uuid::new_v4(), other).await,
        Err(CoreError::ProfileNotFound)
    );
}

#[tokio::test]
async fn blocked_user_receives_no_nearby_signal() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let neighbour = h.user("neighbour", Some(nearby())).await;
    h.engine.safety.block(neighbour, creator).await.unwrap();

    let session = h.open_vibe(creator, origin()).await;
    let creator_profile = h.profile(creator).await;
    let sent = h
        .engine
        .matchmaking
        .signal_nearby(&session, &creator_profile)
        .await;
    assert_eq!(sent, 0);
}

#[tokio::test]
async fn abort_and_block_ends_session_and_blocks_peer() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let joiner = h.user("joiner", None).await;
    let session = h.open_vibe(creator, origin()).await;
    h.engine
        .matchmaking
        .join(Some(joiner), session.id, Some(nearby()))
        .await
        .unwrap();

    let aborted = h
        .engine
        .safety
        .abort_and_block(creator, session.id)
        .await
        .unwrap();
    assert_eq!(aborted.status, SessionStatus::Aborted);
    assert_eq!(aborted.aborted_by, Some(creator));
    assert!(h.profile(creator).await.has_blocked(joiner));

    assert_matches!(
        h.engine.safety.abort_and_block(Uuid::new_v4(), session.id).await,
        Err(CoreError::NotParticipant)
    );
}

#[tokio::test]
async fn failed_abort_blocks_nobody() {
    let h = Harness::new();
    let creator = h.user("creator", None).await;
    let joiner = h.user("joiner", None).await;
    let session = h.open_vibe(creator, origin()).await;
    h.engine
        .matchmaking
        .join(Some(joiner), session.id, Some(nearby()))
        .await
        .unwrap();
    h.engine.matchmaking.abort(creator, session.id).await.unwrap();

    assert_matches!(
        h.engine.safety.abort_and_block(joiner, session.id).await,
        Err(CoreError::InvalidState(_))
    );
    assert!(!h.profile(joiner).await.has_blocked(creator));
}

#[tokio::test]
async fn sos_reaches_everyone_nearby() {
    let h = Harness::new();
    let sender = h.user("sender", Some(origin())).await;
    let neighbour = h.user("neighbour", Some(nearby())).await;
    let hidden = h.user("hidden", Some(nearby())).await;
    let distant = h.user("distant", Some(Coordinates::new(10.0, 10.0))).await;

    // Emergencies ignore incognito mode and blocks.
    let mut profile = h.profile(hidden).await;
    profile.is_incognito = true;
    h.store.upsert(&profile).await.unwrap();
    h.engine.safety.block(neighbour, sender).await.unwrap();

    let mut rx = h.bus.subscribe();
    let result = h.engine.safety.trigger_sos(sender, origin()).await.unwrap();
    assert_eq!(result.notified, 2);
    assert_eq!(result.alert.sender_id, sender);
    assert_eq!(result.alert.sender_name, "sender");
    assert_eq!(result.alert.expires_at, h.clock.now() + Duration::minutes(30));

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, event_types::SAFETY_ALERT);
    assert_eq!(event.actor_id, Some(sender));

    for user in [neighbour, hidden] {
        assert_eq!(h.wait_for_unread(user, 1).await, 1);
        let inbox = h.engine.inbox.list(user, true, 10).await.unwrap();
        assert_eq!(inbox[0].title, titles::SOS);
        assert_eq!(inbox[0].kind, NotificationKind::Safety);
    }
    assert_eq!(h.engine.inbox.unread_count(distant).await.unwrap(), 0);
    assert_eq!(h.engine.inbox.unread_count(sender).await.unwrap(), 0);

    let active = h.store.list_active_for_sender(sender, h.clock.now()).await.unwrap();
    assert_eq!(active, vec![result.alert]);
}

#[tokio::test]
async fn sos_input_is_checked() {
    let h = Harness::new();
    let sender = h.user("sender", None).await;

    assert_matches!(
        h.engine.safety.trigger_sos(sender, Coordinates::new(95.0, 0.0)).await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        h.engine.safety.trigger_sos(Uuid::new_v4(), origin()).await,
        Err(CoreError::ProfileNotFound)
    );

    // Nobody around is still a stored alert.
    let result = h.engine.safety.trigger_sos(sender, origin()).await.unwrap();
    assert_eq!(result.notified, 0);
}

#[tokio::test]
async fn janitor_drops_lapsed_alerts() {
    let h = Harness::new();
    let sender = h.user("sender", None).await;
    h.engine.safety.trigger_sos(sender, origin()).await.unwrap();

    let report = h.engine.janitor.sweep_for(sender).await.unwrap();
    assert_eq!(report.alerts_removed, 0);

    h.clock.advance(Duration::minutes(31));
    let report = h.engine.janitor.sweep_for(sender).await.unwrap();
    assert_eq!(report.alerts_removed, 1);
    assert!(h
        .store
        .list_active_for_sender(sender, h.clock.now())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn location_update_stores_spatial_key() {
    let h = Harness::new();
    let user = h.user("user", None).await;
    let spot = Coordinates::new(51.5007, -0.1246);

    let key = h.engine.safety.update_location(user, spot).await.unwrap();
    assert_eq!(key.len(), 9);
    assert_eq!(key, geo::encode(spot.lat, spot.lng, 9));

    let profile = h.profile(user).await;
    assert_eq!(profile.spatial_key.as_deref(), Some(key.as_str()));
    assert_eq!(profile.last_coords, Some(spot));
    assert_eq!(profile.last_seen_at, Some(h.clock.now()));

    assert_matches!(
        h.engine
            .safety
            .update_location(user, Coordinates::new(0.0, 181.0))
            .await,
        Err(CoreError::Validation(_))
    );
    assert_matches!(
        h.engine.safety.update_location(Uuid::new_v4(), spot).await,
        Err(CoreError::ProfileNotFound)
    );
}
