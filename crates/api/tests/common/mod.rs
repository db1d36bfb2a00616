#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;
use vibe_api::auth::jwt::{generate_access_token, JwtConfig};
use vibe_api::config::ServerConfig;
use vibe_api::router::build_app_router;
use vibe_api::state::AppState;
use vibe_core::profile::Profile;
use vibe_core::store::ProfileStore;
use vibe_core::types::UserId;
use vibe_db::MemoryStore;
use vibe_engine::{EngineConfig, VibeEngine};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        database_url: None,
    }
}

/// The application router over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let (engine, store) = VibeEngine::in_memory(EngineConfig::default());
        let state = AppState {
            engine,
            config: Arc::new(config.clone()),
            pool: None,
        };
        let router = build_app_router(state, &config);
        Self {
            router,
            store,
            config,
        }
    }

    /// Seed an approved profile and return its id and a bearer token.
    pub async fn user(&self, name: &str) -> (UserId, String) {
        let profile = Profile::new(Uuid::new_v4(), name);
        self.store.upsert(&profile).await.unwrap();
        let token = generate_access_token(profile.id, &self.config.jwt).unwrap();
        (profile.id, token)
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
