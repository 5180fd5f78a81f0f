//! Query handlers for the Jira settings context.

use chrono::{DateTime, Utc};
use planpoker_core::error::DomainError;
use planpoker_core::repository::JiraSettingsRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::JiraSettings;

/// Read-only view of Jira settings. Has no field for the API token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JiraSettingsView {
    /// The settings identifier.
    pub id: Uuid,
    /// Jira host.
    pub jira_domain: String,
    /// `https://{jira_domain}`.
    pub jira_url: String,
    /// Account email.
    pub jira_email: String,
    /// Default project key.
    pub jira_project_key: Option<String>,
    /// Whether these are the active settings.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl From<&JiraSettings> for JiraSettingsView {
    fn from(settings: &JiraSettings) -> Self {
        Self {
            id: settings.id,
            jira_domain: settings.jira_domain.clone(),
            jira_url: settings.jira_url(),
            jira_email: settings.jira_email.clone(),
            jira_project_key: settings.jira_project_key.clone(),
            is_active: settings.is_active,
            created_at: settings.created_at,
            updated_at: settings.updated_at,
        }
    }
}

/// Retrieves the active settings of an owner, if any.
///
/// # Errors
///
/// Returns `DomainError::Persistence` if loading fails.
pub async fn get_active_settings(
    owner_id: Option<&str>,
    repo: &dyn JiraSettingsRepository,
) -> Result<Option<JiraSettingsView>, DomainError> {
    Ok(repo
        .find_active(owner_id)
        .await?
        .map(|stored| JiraSettingsView::from(&JiraSettings::from_stored(&stored))))
}

#[cfg(test)]
mod tests {
    use planpoker_test_support::{InMemoryStore, fixed_now};

    use super::*;

    #[tokio::test]
    async fn test_view_never_contains_token() {
        // Arrange
        let store = InMemoryStore::new();
        let settings = JiraSettings::create(
            Uuid::new_v4(),
            None,
            "acme.atlassian.net",
            "ada@acme.io",
            "super-secret",
            None,
            fixed_now(),
        )
        .unwrap();
        store.insert_active(&settings.to_stored()).await.unwrap();

        // Act
        let view = get_active_settings(None, &store).await.unwrap().unwrap();

        // Assert
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("token"));
        assert_eq!(view.jira_url, "https://acme.atlassian.net");
    }

    #[tokio::test]
    async fn test_no_settings_is_none() {
        let store = InMemoryStore::new();

        let view = get_active_settings(Some("someone"), &store).await.unwrap();

        assert!(view.is_none());
    }
}
