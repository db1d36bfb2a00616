//! HTTP-level flows for vibes, profile actions and the inbox.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;
use uuid::Uuid;

/// Create a vibe at the origin and return its id.
async fn create_at_origin(app: &TestApp, token: &str) -> String {
    let response = app
        .post(
            "/api/v1/vibes",
            token,
            json!({ "lat": 0.0, "lng": 0.0, "activity_type": "Coffee", "text": "flat white?" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_applies_defaults() {
    let app = TestApp::new();
    let (creator, token) = app.user("alice").await;

    let response = app
        .post("/api/v1/vibes", &token, json!({ "lat": 0.0, "lng": 0.0 }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["creator_id"], creator.to_string());
    assert_eq!(data["creator_name"], "alice");
    assert_eq!(data["status"], "open");
    assert_eq!(data["location_name"], "Campus Spot");
    assert_eq!(data["activity_type"], "Other");
    assert_eq!(data["duration_mins"], 15);
    assert_eq!(data["secure_key"].as_str().unwrap().len(), 4);
}

#[tokio::test]
async fn create_without_location_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;

    let response = app.post("/api/v1/vibes", &token, json!({ "text": "hi" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "LOCATION_REQUIRED");

    let response = app.post("/api/v1/vibes", &token, json!({ "lat": 1.0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn create_for_unknown_profile_is_404() {
    let app = TestApp::new();
    let token = vibe_api::auth::jwt::generate_access_token(Uuid::new_v4(), &app.config.jwt).unwrap();

    let response = app
        .post("/api/v1/vibes", &token, json!({ "lat": 0.0, "lng": 0.0 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn meetup_flow_over_http() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_id, bob) = app.user("bob").await;
    let id = create_at_origin(&app, &alice).await;

    // Bob discovers it.
    let response = app.get("/api/v1/vibes/feed?lat=0.0&lng=0.004", &bob).await;
    assert_eq!(response.status(), StatusCode::OK);
    let feed = body_json(response).await["data"].clone();
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert_eq!(feed[0]["id"], id.as_str());
    assert_eq!(feed[0]["is_mine"], false);
    assert_eq!(feed[0]["secure_key"], "");
    assert_eq!(feed[0]["distance_label"], "445m away");

    // Bob joins.
    let response = app
        .post(&format!("/api/v1/vibes/{id}/join"), &bob, json!({ "lat": 0.0, "lng": 0.004 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let joined = body_json(response).await["data"].clone();
    assert_eq!(joined["status"], "matched");
    assert_eq!(joined["participant_id"], bob_id.to_string());
    assert_eq!(joined["already_joined"], false);
    assert_eq!(joined["secure_key"].as_str().unwrap().len(), 4);

    // Both enter the room; the second entry starts the timer.
    let response = app
        .post(&format!("/api/v1/vibes/{id}/presence"), &alice, json!({ "present": true }))
        .await;
    assert_eq!(body_json(response).await["data"]["handshake"], false);
    let response = app
        .post(&format!("/api/v1/vibes/{id}/presence"), &bob, json!({ "present": true }))
        .await;
    let started = body_json(response).await["data"].clone();
    assert_eq!(started["handshake"], true);
    assert_eq!(started["session_started"], true);

    // Arrivals.
    let response = app
        .post(&format!("/api/v1/vibes/{id}/arrival"), &alice, json!({}))
        .await;
    let first = body_json(response).await["data"].clone();
    assert_eq!(first["completed"], false);
    assert_eq!(first["trust_points"], 1);

    let response = app
        .post(&format!("/api/v1/vibes/{id}/arrival"), &bob, json!({}))
        .await;
    let second = body_json(response).await["data"].clone();
    assert_eq!(second["completed"], true);
    assert_eq!(second["status"], "completed");

    // A repeat is acknowledged without a reward.
    let response = app
        .post(&format!("/api/v1/vibes/{id}/arrival"), &bob, json!({}))
        .await;
    let repeat = body_json(response).await["data"].clone();
    assert_eq!(repeat["already_logged"], true);
    assert_eq!(repeat["trust_points"], serde_json::Value::Null);

    // No-show reports are closed once the session completed.
    let response = app
        .post(
            &format!("/api/v1/vibes/{id}/ghost"),
            &alice,
            json!({ "accused_id": bob_id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");

    // Walking away reclaims the record.
    let response = app.post(&format!("/api/v1/vibes/{id}/leave"), &bob, json!({})).await;
    assert_eq!(body_json(response).await["data"]["deleted"], false);
    let response = app.post(&format!("/api/v1/vibes/{id}/leave"), &alice, json!({})).await;
    assert_eq!(body_json(response).await["data"]["deleted"], true);

    let response = app.get(&format!("/api/v1/vibes/{id}"), &alice).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn join_errors_map_to_http_statuses() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (_, bob) = app.user("bob").await;
    let (_, carol) = app.user("carol").await;
    let id = create_at_origin(&app, &alice).await;
    let join = format!("/api/v1/vibes/{id}/join");

    let response = app.post(&join, &alice, json!({ "lat": 0.0, "lng": 0.0 })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "SELF_JOIN_FORBIDDEN");

    let response = app.post(&join, &bob, json!({ "lat": 0.0, "lng": 0.01 })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "TOO_FAR");

    let response = app.post(&join, &bob, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "LOCATION_REQUIRED");

    let response = app.post(&join, &bob, json!({ "lat": 0.0, "lng": 0.004 })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.post(&join, &carol, json!({ "lat": 0.0, "lng": 0.004 })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ALREADY_FULL");

    // A stranger can no longer see the matched session.
    let response = app.get(&format!("/api/v1/vibes/{id}"), &carol).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let missing = format!("/api/v1/vibes/{}/join", Uuid::now_v7());
    let response = app.post(&missing, &bob, json!({ "lat": 0.0, "lng": 0.0 })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn abort_with_block_and_creator_delete() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_id, bob) = app.user("bob").await;

    let id = create_at_origin(&app, &alice).await;
    app.post(&format!("/api/v1/vibes/{id}/join"), &bob, json!({ "lat": 0.0, "lng": 0.004 }))
        .await;

    let response = app
        .post(&format!("/api/v1/vibes/{id}/abort"), &alice, json!({ "block": true }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let aborted = body_json(response).await["data"].clone();
    assert_eq!(aborted["status"], "aborted");

    let response = app
        .post("/api/v1/me/blocks", &alice, json!({ "user_id": bob_id }))
        .await;
    assert_eq!(body_json(response).await["data"]["added"], false);

    // Hard delete is creator-only.
    let other = create_at_origin(&app, &alice).await;
    let response = app.delete(&format!("/api/v1/vibes/{other}"), &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = app.delete(&format!("/api/v1/vibes/{other}"), &alice).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn location_sync_and_self_block() {
    let app = TestApp::new();
    let (alice_id, alice) = app.user("alice").await;

    let response = app
        .put("/api/v1/me/location", &alice, json!({ "lat": 51.5007, "lng": -0.1246 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let key = body_json(response).await["data"]["spatial_key"].clone();
    assert_eq!(key.as_str().unwrap().len(), 9);

    let response = app.put("/api/v1/me/location", &alice, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/v1/me/blocks", &alice, json!({ "user_id": alice_id }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn inbox_endpoints() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (_, bob) = app.user("bob").await;
    let id = create_at_origin(&app, &alice).await;
    app.post(&format!("/api/v1/vibes/{id}/join"), &bob, json!({ "lat": 0.0, "lng": 0.004 }))
        .await;

    // The join notice is delivered in the background.
    let mut count = serde_json::Value::Null;
    for _ in 0..100 {
        let response = app.get("/api/v1/notifications/unread-count", &alice).await;
        count = body_json(response).await["data"]["count"].clone();
        if count == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(count, 1);

    let response = app.get("/api/v1/notifications?unread_only=true", &alice).await;
    let list = body_json(response).await["data"].clone();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "CONNECTION MADE");
    assert_eq!(list[0]["kind"], "match");

    let response = app.post("/api/v1/notifications/read-all", &alice, json!({})).await;
    assert_eq!(body_json(response).await["data"]["marked_read"], 1);

    let response = app.delete("/api/v1/notifications", &alice).await;
    assert_eq!(body_json(response).await["data"]["deleted"], 1);

    let response = app.get("/api/v1/notifications", &alice).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn abort_accepts_an_empty_body() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (bob_id, bob) = app.user("bob").await;
    let id = create_at_origin(&app, &alice).await;
    app.post(&format!("/api/v1/vibes/{id}/join"), &bob, json!({ "lat": 0.0, "lng": 0.004 }))
        .await;

    let response = app
        .send(Method::POST, &format!("/api/v1/vibes/{id}/abort"), Some(&alice), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "aborted");

    // Nobody was blocked.
    let response = app
        .post("/api/v1/me/blocks", &alice, json!({ "user_id": bob_id }))
        .await;
    assert_eq!(body_json(response).await["data"]["added"], true);
}

#[tokio::test]
async fn sos_alerts_nearby_users() {
    let app = TestApp::new();
    let (alice_id, alice) = app.user("alice").await;
    let (_, bob) = app.user("bob").await;
    app.put("/api/v1/me/location", &bob, json!({ "lat": 0.0, "lng": 0.004 }))
        .await;

    let response = app.post("/api/v1/me/sos", &alice, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "LOCATION_REQUIRED");

    let response = app
        .post("/api/v1/me/sos", &alice, json!({ "lat": 0.0, "lng": 0.0 }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["notified"], 1);
    assert_eq!(data["alert"]["sender_id"], alice_id.to_string());

    let mut list = serde_json::Value::Null;
    for _ in 0..100 {
        let response = app.get("/api/v1/notifications?unread_only=true", &bob).await;
        list = body_json(response).await["data"].clone();
        if list.as_array().is_some_and(|l| !l.is_empty()) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(list[0]["title"], "SOS");
    assert_eq!(list[0]["kind"], "safety");
}
