//! Jira connection settings.

use chrono::{DateTime, Utc};
use planpoker_core::error::DomainError;
use planpoker_core::repository::StoredJiraSettings;
use uuid::Uuid;

const MAX_DOMAIN_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 255;
const MAX_PROJECT_KEY_LEN: usize = 50;

/// Partial update of Jira settings. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct JiraSettingsChanges {
    /// New Jira host.
    pub jira_domain: Option<String>,
    /// New account email.
    pub jira_email: Option<String>,
    /// New API token.
    pub jira_api_token: Option<String>,
    /// New project key; `Some(None)` clears it.
    pub jira_project_key: Option<Option<String>>,
}

/// Connection settings for one owner's Jira site.
#[derive(Debug, Clone, PartialEq)]
pub struct JiraSettings {
    /// Settings identifier.
    pub id: Uuid,
    /// Owner; `None` for the global settings.
    pub owner_id: Option<String>,
    /// Jira host, e.g. `acme.atlassian.net`.
    pub jira_domain: String,
    /// Account email.
    pub jira_email: String,
    jira_api_token: String,
    /// Default project key.
    pub jira_project_key: Option<String>,
    /// Whether these are the owner's active settings.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

fn validate_domain(domain: &str) -> Result<String, DomainError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(DomainError::Validation(
            "jira_domain must not be blank".to_owned(),
        ));
    }
    if domain.chars().count() > MAX_DOMAIN_LEN {
        return Err(DomainError::Validation(format!(
            "jira_domain must be at most {MAX_DOMAIN_LEN} characters"
        )));
    }
    Ok(domain.to_owned())
}

fn validate_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(DomainError::Validation(format!(
            "jira_email must be at most {MAX_EMAIL_LEN} characters"
        )));
    }
    let valid = match email.split_once('@') {
        Some((local, host)) => {
            !local.is_empty()
                && !host.contains('@')
                && host.contains('.')
                && !host.starts_with('.')
                && !host.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::Validation(format!(
            "jira_email {email:?} is not a valid email address"
        )));
    }
    Ok(email.to_owned())
}

fn validate_token(token: &str) -> Result<String, DomainError> {
    if token.trim().is_empty() {
        return Err(DomainError::Validation(
            "jira_api_token must not be blank".to_owned(),
        ));
    }
    Ok(token.to_owned())
}

fn validate_project_key(key: Option<String>) -> Result<Option<String>, DomainError> {
    let key = key.map(|k| k.trim().to_owned()).filter(|k| !k.is_empty());
    if key
        .as_ref()
        .is_some_and(|k| k.chars().count() > MAX_PROJECT_KEY_LEN)
    {
        return Err(DomainError::Validation(format!(
            "jira_project_key must be at most {MAX_PROJECT_KEY_LEN} characters"
        )));
    }
    Ok(key)
}

impl JiraSettings {
    /// Creates active settings.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a field is blank, too long or
    /// the email is malformed.
    pub fn create(
        id: Uuid,
        owner_id: Option<String>,
        jira_domain: &str,
        jira_email: &str,
        jira_api_token: &str,
        jira_project_key: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            owner_id,
            jira_domain: validate_domain(jira_domain)?,
            jira_email: validate_email(jira_email)?,
            jira_api_token: validate_token(jira_api_token)?,
            jira_project_key: validate_project_key(jira_project_key)?,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. Nothing changes if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` under the same rules as
    /// [`JiraSettings::create`].
    pub fn apply(
        &mut self,
        changes: JiraSettingsChanges,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let domain = changes.jira_domain.as_deref().map(validate_domain).transpose()?;
        let email = changes.jira_email.as_deref().map(validate_email).transpose()?;
        let token = changes
            .jira_api_token
            .as_deref()
            .map(validate_token)
            .transpose()?;
        let project_key = changes
            .jira_project_key
            .map(validate_project_key)
            .transpose()?;

        if let Some(domain) = domain {
            self.jira_domain = domain;
        }
        if let Some(email) = email {
            self.jira_email = email;
        }
        if let Some(token) = token {
            self.jira_api_token = token;
        }
        if let Some(project_key) = project_key {
            self.jira_project_key = project_key;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Base URL of the Jira site.
    #[must_use]
    pub fn jira_url(&self) -> String {
        format!("https://{}", self.jira_domain)
    }

    /// Rebuilds settings from their stored record.
    #[must_use]
    pub fn from_stored(stored: &StoredJiraSettings) -> Self {
        Self {
            id: stored.id,
            owner_id: stored.owner_id.clone(),
            jira_domain: stored.jira_domain.clone(),
            jira_email: stored.jira_email.clone(),
            jira_api_token: stored.jira_api_token.clone(),
            jira_project_key: stored.jira_project_key.clone(),
            is_active: stored.is_active,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    /// Converts the settings into their stored record.
    #[must_use]
    pub fn to_stored(&self) -> StoredJiraSettings {
        StoredJiraSettings {
            id: self.id,
            owner_id: self.owner_id.clone(),
            jira_domain: self.jira_domain.clone(),
            jira_email: self.jira_email.clone(),
            jira_api_token: self.jira_api_token.clone(),
            jira_project_key: self.jira_project_key.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
