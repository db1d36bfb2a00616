use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vibe_api::config::ServerConfig;
use vibe_api::router::build_app_router;
use vibe_api::state::AppState;
use vibe_core::clock::{Clock, SystemClock};
use vibe_db::{MemoryStore, PgStore};
use vibe_engine::{EngineConfig, VibeEngine};
use vibe_events::{EventBus, EventLog};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vibe_api=debug,vibe_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    let engine_config = EngineConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let event_log_handle = tokio::spawn(EventLog::run(event_bus.subscribe()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // --- Storage ---
    let (engine, pool) = match &config.database_url {
        Some(database_url) => {
            let pool = vibe_db::create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            vibe_db::health_check(&pool).await?;
            vibe_db::run_migrations(&pool).await?;

            let store = Arc::new(PgStore::new(pool.clone()));
            let engine = VibeEngine::with_store(store, Arc::clone(&event_bus), clock, engine_config);
            (engine, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, running on the in-memory store");
            let store = Arc::new(MemoryStore::new());
            let engine = VibeEngine::with_store(store, Arc::clone(&event_bus), clock, engine_config);
            (engine, None)
        }
    };

    // --- Router ---
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
        pool,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse::<IpAddr>()?, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The router (and the engine inside it) is gone; dropping the last bus
    // handle closes the channel and ends the event log.
    drop(event_bus);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, event_log_handle).await.is_err() {
        tracing::warn!("Event log did not drain before the shutdown timeout");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
