//! Project domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use validator::Validate;

/// Payload shape used when notifying a project's webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookProvider {
    Discord,
    Slack,
    Generic,
}

impl WebhookProvider {
    /// Unknown or empty provider names fall back to the generic envelope.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "discord" => WebhookProvider::Discord,
            "slack" => WebhookProvider::Slack,
            _ => WebhookProvider::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookProvider::Discord => "discord",
            WebhookProvider::Slack => "slack",
            WebhookProvider::Generic => "generic",
        }
    }
}

impl fmt::Display for WebhookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub slug: String,
    pub webhook_provider: Option<String>,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            id: 0,
            user_id: 0,
            name: String::new(),
            slug: String::new(),
            webhook_provider: None,
            webhook_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

impl Project {
    /// Where and how to notify about new posts, if the project has a webhook.
    pub fn webhook_target(&self) -> Option<(WebhookProvider, &str)> {
        let url = self.webhook_url.as_deref().map(str::trim)?;
        if url.is_empty() {
            return None;
        }
        let provider = WebhookProvider::parse(self.webhook_provider.as_deref().unwrap_or(""));
        Some((provider, url))
    }
}

/// Input for creating or replacing a project
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 255, message = "name is required (max 255 characters)"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "slug is required (max 255 characters)"))]
    pub slug: String,
    #[serde(default)]
    pub webhook_provider: Option<WebhookProvider>,
    #[serde(default)]
    #[validate(length(max = 2048, message = "webhook_url must be at most 2048 characters"))]
    pub webhook_url: Option<String>,
}

impl ProjectInput {
    /// Blank webhook URLs are stored as NULL.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn webhook_provider(&self) -> Option<&'static str> {
        self.webhook_url()
            .map(|_| self.webhook_provider.unwrap_or(WebhookProvider::Generic).as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckSlugQuery {
    #[validate(length(min = 1, max = 255, message = "slug is required (max 255 characters)"))]
    pub slug: String,
}
