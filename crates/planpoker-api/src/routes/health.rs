//! Health check endpoint.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::app;
    use crate::routes::test_helpers::{TestApp, send};

    #[tokio::test]
    async fn test_health_returns_ok_with_version() {
        let app = app(TestApp::new().state);

        let (status, json) = send(app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let app = app(TestApp::new().state);

        let (status, _) = send(app, "GET", "/api/v1/nonexistent", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
