//! Post domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Default for Post {
    fn default() -> Self {
        Self {
            id: 0,
            project_id: 0,
            title: String::new(),
            content: String::new(),
            category: String::new(),
            status: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(range(min = 1, message = "project_id is required"))]
    pub project_id: i64,
    #[validate(length(min = 1, max = 255, message = "title is required (max 255 characters)"))]
    pub title: String,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "category must be at most 50 characters"))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "status must be at most 20 characters"))]
    pub status: String,
}

/// Query string accepted by the post listing, in addition to pagination.
#[derive(Debug, Clone, Deserialize)]
pub struct PostScopeQuery {
    pub project_id: Option<i64>,
}
