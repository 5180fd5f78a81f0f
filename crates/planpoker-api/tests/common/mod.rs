//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use planpoker_core::clock::Clock;
use planpoker_core::rng::DeterministicRng;
use planpoker_store::PgStore;
use planpoker_test_support::{FixedClock, RecordingBroadcaster, SequenceRng, fixed_now};
use sqlx::PgPool;
use tower::ServiceExt;

use planpoker_api::routes;
use planpoker_api::state::AppState;

/// Build the full app router with a real `PgStore` and deterministic
/// Clock/RNG. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_rng(pool, SequenceRng::new(vec![0; 6]))
}

/// Build the full app router with a custom `SequenceRng` for tests that need
/// a specific room slug suffix.
pub fn build_test_app_with_rng(pool: PgPool, rng: SequenceRng) -> Router {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(fixed_now()));
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let store = Arc::new(PgStore::new(pool));
    let app_state = AppState::new(store, clock, rng, Arc::new(RecordingBroadcaster::new()));

    routes::app(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
