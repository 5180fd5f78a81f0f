//! Command handlers for the Jira settings context.

use planpoker_core::clock::Clock;
use planpoker_core::error::DomainError;
use planpoker_core::repository::JiraSettingsRepository;
use tracing::info;
use uuid::Uuid;

use crate::application::query_handlers::JiraSettingsView;
use crate::domain::aggregates::JiraSettings;
use crate::domain::commands::{DeleteJiraSettings, StoreJiraSettings, UpdateJiraSettings};

/// Handles the `StoreJiraSettings` command. The owner's previously active
/// settings are deactivated in the same write.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a field is invalid.
pub async fn handle_store_settings(
    command: &StoreJiraSettings,
    clock: &dyn Clock,
    repo: &dyn JiraSettingsRepository,
) -> Result<JiraSettingsView, DomainError> {
    let settings = JiraSettings::create(
        Uuid::new_v4(),
        command.owner_id.clone(),
        &command.jira_domain,
        &command.jira_email,
        &command.jira_api_token,
        command.jira_project_key.clone(),
        clock.now(),
    )?;
    repo.insert_active(&settings.to_stored()).await?;

    info!(
        settings_id = %settings.id,
        owner_id = ?settings.owner_id,
        correlation_id = %command.correlation_id,
        "jira settings stored"
    );

    Ok(JiraSettingsView::from(&settings))
}

/// Handles the `UpdateJiraSettings` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the settings do not exist and
/// `DomainError::Validation` if a changed field is invalid.
pub async fn handle_update_settings(
    command: &UpdateJiraSettings,
    clock: &dyn Clock,
    repo: &dyn JiraSettingsRepository,
) -> Result<JiraSettingsView, DomainError> {
    let stored = repo
        .load_settings(command.settings_id)
        .await?
        .ok_or_else(|| DomainError::not_found("jira settings", command.settings_id))?;
    let mut settings = JiraSettings::from_stored(&stored);

    settings.apply(command.changes.clone(), clock.now())?;
    repo.update_settings(&settings.to_stored()).await?;

    info!(
        settings_id = %settings.id,
        correlation_id = %command.correlation_id,
        "jira settings updated"
    );

    Ok(JiraSettingsView::from(&settings))
}

/// Handles the `DeleteJiraSettings` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the settings do not exist.
pub async fn handle_delete_settings(
    command: &DeleteJiraSettings,
    repo: &dyn JiraSettingsRepository,
) -> Result<(), DomainError> {
    if !repo.delete_settings(command.settings_id).await? {
        return Err(DomainError::not_found("jira settings", command.settings_id));
    }
    info!(
        settings_id = %command.settings_id,
        correlation_id = %command.correlation_id,
        "jira settings deleted"
    );
    Ok(())
}
