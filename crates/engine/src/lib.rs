//! Vibe matching engine.
//!
//! Every operation that changes a session goes through
//! [`EngineContext::mutate_session`]: read, apply a pure transition from
//! `vibe_core::session`, commit with a version check, retry on conflict.
//! Side effects (notifications, location refresh, cleanup) run after the
//! commit and are logged rather than propagated when they fail.

use std::sync::Arc;

use vibe_core::clock::{Clock, SystemClock};
use vibe_core::store::{NotificationStore, ProfileStore, SafetyAlertStore, SessionStore};
use vibe_db::MemoryStore;
use vibe_events::EventBus;

pub mod arrival;
pub mod config;
pub mod context;
pub mod feed;
pub mod inbox;
pub mod janitor;
pub mod matchmaking;
pub mod presence;
pub mod safety;

pub use arrival::{ArrivalLedger, ArrivalResult, GhostReportResult};
pub use config::EngineConfig;
pub use context::EngineContext;
pub use feed::{FeedEntry, FeedService, ALL_ACTIVITIES};
pub use inbox::{InboxService, DEFAULT_INBOX_LIMIT};
pub use janitor::{Janitor, SweepReport};
pub use matchmaking::{CreateVibe, JoinResult, MatchmakingEngine};
pub use presence::{PresenceResult, PresenceTracker};
pub use safety::{SafetyService, SosResult};

/// All services over one shared context.
#[derive(Clone)]
pub struct VibeEngine {
    pub ctx: Arc<EngineContext>,
    pub matchmaking: MatchmakingEngine,
    pub presence: PresenceTracker,
    pub arrivals: ArrivalLedger,
    pub janitor: Janitor,
    pub feed: FeedService,
    pub safety: SafetyService,
    pub inbox: InboxService,
}

impl VibeEngine {
    pub fn new(ctx: EngineContext) -> Self {
        let ctx = Arc::new(ctx);
        Self {
            matchmaking: MatchmakingEngine::new(ctx.clone()),
            presence: PresenceTracker::new(ctx.clone()),
            arrivals: ArrivalLedger::new(ctx.clone()),
            janitor: Janitor::new(ctx.clone()),
            feed: FeedService::new(ctx.clone()),
            safety: SafetyService::new(ctx.clone()),
            inbox: InboxService::new(ctx.clone()),
            ctx,
        }
    }

    /// Build an engine whose stores are all the same backend.
    pub fn with_store<S>(store: Arc<S>, bus: Arc<EventBus>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self
    where
        S: SessionStore + NotificationStore + ProfileStore + SafetyAlertStore + 'static,
    {
        Self::new(EngineContext::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            bus,
            clock,
            config,
        ))
    }

    /// An engine over a fresh [`MemoryStore`] and the system clock.
    pub fn in_memory(config: EngineConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = Self::with_store(
            store.clone(),
            Arc::new(EventBus::default()),
            Arc::new(SystemClock),
            config,
        );
        (engine, store)
    }
}
