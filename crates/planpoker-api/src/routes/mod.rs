//! Route modules organized by bounded context.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod emoji;
pub mod health;
pub mod jira;
pub mod rooms;
pub mod stories;

/// Builds the complete application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    Router::new()
        .merge(health::router())
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// All `/api/v1` routes, without the state applied.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(rooms::router())
        .merge(stories::router())
        .merge(emoji::router())
        .merge(jira::router())
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use planpoker_core::clock::Clock;
    use planpoker_core::rng::DeterministicRng;
    use planpoker_test_support::{
        FailingStore, FixedClock, InMemoryStore, MockRng, RecordingBroadcaster, fixed_now,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::AppState;

    pub(crate) struct TestApp {
        pub state: AppState,
        pub store: Arc<InMemoryStore>,
        pub broadcaster: Arc<RecordingBroadcaster>,
    }

    impl TestApp {
        pub(crate) fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let broadcaster = Arc::new(RecordingBroadcaster::new());
            let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(fixed_now()));
            let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
            let state = AppState::new(store.clone(), clock, rng, broadcaster.clone());
            Self {
                state,
                store,
                broadcaster,
            }
        }

        pub(crate) fn router(&self) -> Router {
            super::api_router().with_state(self.state.clone())
        }

        pub(crate) async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
            send(self.router(), "POST", uri, Some(body)).await
        }

        pub(crate) async fn put(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
            send(self.router(), "PUT", uri, Some(body)).await
        }

        pub(crate) async fn get(&self, uri: &str) -> (StatusCode, Value) {
            send(self.router(), "GET", uri, None).await
        }

        pub(crate) async fn delete(&self, uri: &str) -> (StatusCode, Value) {
            send(self.router(), "DELETE", uri, None).await
        }

        /// Creates a room with an admin and returns `(room_id, admin_id)`.
        pub(crate) async fn seed_room(&self, card_deck: &str) -> (String, String) {
            let (status, json) = self
                .post(
                    "/rooms",
                    &serde_json::json!({
                        "name": "Sprint 42",
                        "card_deck": card_deck,
                        "admin_name": "Ada",
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{json}");
            (
                json["room"]["room_id"].as_str().unwrap().to_owned(),
                json["admin"]["participant_id"].as_str().unwrap().to_owned(),
            )
        }

        /// Creates a story in a room and returns its id.
        pub(crate) async fn seed_story(&self, room_id: &str, title: &str) -> String {
            let (status, json) = self
                .post(
                    &format!("/rooms/{room_id}/stories"),
                    &serde_json::json!({ "title": title }),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{json}");
            json["story_id"].as_str().unwrap().to_owned()
        }
    }

    pub(crate) fn failing_router() -> Router {
        let store = Arc::new(FailingStore);
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(fixed_now()));
        let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
        let state = AppState::new(store, clock, rng, Arc::new(RecordingBroadcaster::new()));
        super::api_router().with_state(state)
    }

    pub(crate) async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}
