//! Commands for the Jira settings context.

use planpoker_core::command::Command;
use uuid::Uuid;

use super::aggregates::JiraSettingsChanges;

/// Command to store new active settings for an owner.
#[derive(Debug, Clone)]
pub struct StoreJiraSettings {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Owner; `None` for the global settings.
    pub owner_id: Option<String>,
    /// Jira host.
    pub jira_domain: String,
    /// Account email.
    pub jira_email: String,
    /// API token.
    pub jira_api_token: String,
    /// Default project key.
    pub jira_project_key: Option<String>,
}

impl Command for StoreJiraSettings {
    fn command_type(&self) -> &'static str {
        "jira.store_settings"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change existing settings.
#[derive(Debug, Clone)]
pub struct UpdateJiraSettings {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The settings to change.
    pub settings_id: Uuid,
    /// Fields to change.
    pub changes: JiraSettingsChanges,
}

impl Command for UpdateJiraSettings {
    fn command_type(&self) -> &'static str {
        "jira.update_settings"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to delete settings.
#[derive(Debug, Clone)]
pub struct DeleteJiraSettings {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The settings to delete.
    pub settings_id: Uuid,
}

impl Command for DeleteJiraSettings {
    fn command_type(&self) -> &'static str {
        "jira.delete_settings"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
