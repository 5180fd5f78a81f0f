//! Routes for the Jira settings bounded context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::put};
use serde::{Deserialize, Deserializer};
use tracing::{info, instrument};
use uuid::Uuid;

use planpoker_jira::application::command_handlers;
use planpoker_jira::application::query_handlers::{self, JiraSettingsView};
use planpoker_jira::domain::aggregates::JiraSettingsChanges;
use planpoker_jira::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of GET /jira/settings.
#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    /// Owner whose settings to return; the global settings when absent.
    pub owner_id: Option<String>,
}

/// Request body for POST /jira/settings.
#[derive(Debug, Deserialize)]
pub struct StoreSettingsRequest {
    /// Owner; `None` for the global settings.
    pub owner_id: Option<String>,
    /// Jira host, e.g. `acme.atlassian.net`.
    pub jira_domain: String,
    /// Account email.
    pub jira_email: String,
    /// API token. Never returned.
    pub jira_api_token: String,
    /// Default project key.
    pub jira_project_key: Option<String>,
}

/// Request body for PUT /jira/settings/{settings_id}. Absent fields are
/// left unchanged; `"jira_project_key": null` clears the key.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// New Jira host.
    pub jira_domain: Option<String>,
    /// New account email.
    pub jira_email: Option<String>,
    /// New API token.
    pub jira_api_token: Option<String>,
    /// New project key.
    #[serde(default, deserialize_with = "present")]
    pub jira_project_key: Option<Option<String>>,
}

/// Maps a present field (including `null`) to `Some`, so that `default`
/// only covers the absent case.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// GET /jira/settings
#[instrument(skip(state))]
async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> Result<Json<Option<JiraSettingsView>>, ApiError> {
    let view =
        query_handlers::get_active_settings(query.owner_id.as_deref(), &*state.jira_settings)
            .await?;
    Ok(Json(view))
}

/// POST /jira/settings
#[instrument(skip(state, request), fields(jira_domain = %request.jira_domain))]
async fn store_settings(
    State(state): State<AppState>,
    Json(request): Json<StoreSettingsRequest>,
) -> Result<Json<JiraSettingsView>, ApiError> {
    let command = commands::StoreJiraSettings {
        correlation_id: Uuid::new_v4(),
        owner_id: request.owner_id,
        jira_domain: request.jira_domain,
        jira_email: request.jira_email,
        jira_api_token: request.jira_api_token,
        jira_project_key: request.jira_project_key,
    };

    info!(correlation_id = %command.correlation_id, "handling store_jira_settings command");

    let view = command_handlers::handle_store_settings(
        &command,
        state.clock.as_ref(),
        &*state.jira_settings,
    )
    .await?;

    Ok(Json(view))
}

/// PUT /jira/settings/{settings_id}
#[instrument(skip(state, request))]
async fn update_settings(
    State(state): State<AppState>,
    Path(settings_id): Path<Uuid>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<JiraSettingsView>, ApiError> {
    let command = commands::UpdateJiraSettings {
        correlation_id: Uuid::new_v4(),
        settings_id,
        changes: JiraSettingsChanges {
            jira_domain: request.jira_domain,
            jira_email: request.jira_email,
            jira_api_token: request.jira_api_token,
            jira_project_key: request.jira_project_key,
        },
    };

    info!(correlation_id = %command.correlation_id, "handling update_jira_settings command");

    let view = command_handlers::handle_update_settings(
        &command,
        state.clock.as_ref(),
        &*state.jira_settings,
    )
    .await?;

    Ok(Json(view))
}

/// DELETE /jira/settings/{settings_id}
#[instrument(skip(state))]
async fn delete_settings(
    State(state): State<AppState>,
    Path(settings_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteJiraSettings {
        correlation_id: Uuid::new_v4(),
        settings_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_jira_settings command");

    command_handlers::handle_delete_settings(&command, &*state.jira_settings).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for the Jira settings context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jira/settings", get(get_settings).post(store_settings))
        .route(
            "/jira/settings/{settings_id}",
            put(update_settings).delete(delete_settings),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::routes::test_helpers::{TestApp, failing_router, send};

    fn settings_body(domain: &str) -> Value {
        json!({
            "jira_domain": domain,
            "jira_email": "ada@acme.io",
            "jira_api_token": "super-secret",
            "jira_project_key": "PP",
        })
    }

    #[tokio::test]
    async fn test_store_then_get_hides_token() {
        // Arrange
        let app = TestApp::new();
        app.post("/jira/settings", &settings_body("acme.atlassian.net"))
            .await;

        // Act
        let (status, json) = app.get("/jira/settings").await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["jira_url"], "https://acme.atlassian.net");
        assert_eq!(json["is_active"], true);
        assert!(json.get("jira_api_token").is_none());
        assert!(!json.to_string().contains("super-secret"));
    }

    #[tokio::test]
    async fn test_get_without_settings_is_null() {
        let app = TestApp::new();

        let (status, json) = app.get("/jira/settings?owner_id=nobody").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json.is_null());
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_email() {
        let app = TestApp::new();
        let mut body = settings_body("acme.atlassian.net");
        body["jira_email"] = json!("not-an-email");

        let (status, json) = app.post("/jira/settings", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_update_null_project_key_clears_it_and_absent_fields_stay() {
        // Arrange
        let app = TestApp::new();
        let (_, created) = app
            .post("/jira/settings", &settings_body("acme.atlassian.net"))
            .await;
        let id = created["id"].as_str().unwrap();

        // Act
        let (status, json) = app
            .put(
                &format!("/jira/settings/{id}"),
                &json!({ "jira_project_key": null }),
            )
            .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert!(json["jira_project_key"].is_null());
        assert_eq!(json["jira_domain"], "acme.atlassian.net");
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_is_404() {
        let app = TestApp::new();
        let (_, created) = app
            .post("/jira/settings", &settings_body("acme.atlassian.net"))
            .await;
        let uri = format!("/jira/settings/{}", created["id"].as_str().unwrap());

        let (first, _) = app.delete(&uri).await;
        let (second, json) = app.delete(&uri).await;

        assert_eq!(first, StatusCode::NO_CONTENT);
        assert_eq!(second, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_store_returns_500_when_store_fails() {
        let (status, json) = send(
            failing_router(),
            "POST",
            "/jira/settings",
            Some(&settings_body("acme.atlassian.net")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "persistence_error");
    }
}
