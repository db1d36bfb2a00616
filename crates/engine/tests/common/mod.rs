use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use vibe_core::clock::{Clock, ManualClock};
use vibe_core::geo::{self, Coordinates};
use vibe_core::profile::Profile;
use vibe_core::session::Session;
use vibe_core::store::{NotificationStore, ProfileStore};
use vibe_core::types::UserId;
use vibe_db::MemoryStore;
use vibe_engine::{CreateVibe, EngineConfig, VibeEngine};
use vibe_events::EventBus;

/// Engine over an in-memory store with a hand-driven clock.
pub struct Harness {
    pub engine: VibeEngine,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub bus: Arc<EventBus>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let bus = Arc::new(EventBus::default());
        let engine = VibeEngine::with_store(store.clone(), bus.clone(), clock.clone(), config);
        Self {
            engine,
            store,
            clock,
            bus,
        }
    }

    /// Seed an approved profile, optionally with a known location.
    pub async fn user(&self, name: &str, at: Option<Coordinates>) -> UserId {
        let mut profile = Profile::new(Uuid::new_v4(), name);
        if let Some(coords) = at {
            profile.last_coords = Some(coords);
            profile.spatial_key = Some(geo::encode(coords.lat, coords.lng, 9));
            profile.last_seen_at = Some(Utc::now());
        }
        self.store.upsert(&profile).await.unwrap();
        profile.id
    }

    pub async fn profile(&self, id: UserId) -> Profile {
        ProfileStore::get(self.store.as_ref(), id).await.unwrap().unwrap()
    }

    pub async fn trust(&self, id: UserId) -> i64 {
        self.profile(id).await.trust_points
    }

    /// Create a 15 minute "Coffee" vibe at `at`.
    pub async fn open_vibe(&self, creator: UserId, at: Coordinates) -> Session {
        self.engine
            .matchmaking
            .create(
                Some(creator),
                CreateVibe {
                    text: Some("coffee?".into()),
                    activity_type: Some("Coffee".into()),
                    duration_mins: Some(15),
                    ..Default::default()
                },
                Some(at),
            )
            .await
            .unwrap()
    }

    /// Poll until `recipient` has `expected` unread notifications.
    pub async fn wait_for_unread(&self, recipient: UserId, expected: i64) -> i64 {
        let mut count = 0;
        for _ in 0..100 {
            count = self
                .store
                .unread_count(recipient, self.clock.now())
                .await
                .unwrap();
            if count == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        count
    }
}

/// The origin used by most scenarios.
pub fn origin() -> Coordinates {
    Coordinates::new(0.0, 0.0)
}

/// About 445 m east of the origin.
pub fn nearby() -> Coordinates {
    Coordinates::new(0.0, 0.004)
}

/// About 1.1 km east of the origin.
pub fn too_far() -> Coordinates {
    Coordinates::new(0.0, 0.01)
}
