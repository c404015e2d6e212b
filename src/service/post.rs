//! Post business logic

use crate::domain::{CreatePostInput, Page, PaginationSpec, Post};
use crate::error::{AppError, Result};
use crate::middleware::RequestId;
use crate::repository::{PostRepository, ProjectRepository};
use crate::service::webhook::{WebhookEvent, WebhookPublisher};
use std::sync::Arc;
use validator::Validate;

pub struct PostService<P: PostRepository, R: ProjectRepository> {
    post_repo: Arc<P>,
    project_repo: Arc<R>,
    webhook_publisher: Arc<dyn WebhookPublisher>,
}

impl<P: PostRepository, R: ProjectRepository> PostService<P, R> {
    pub fn new(
        post_repo: Arc<P>,
        project_repo: Arc<R>,
        webhook_publisher: Arc<dyn WebhookPublisher>,
    ) -> Self {
        Self {
            post_repo,
            project_repo,
            webhook_publisher,
        }
    }

    /// Create a post under one of the caller's projects.
    ///
    /// When the project has a webhook URL a notification is queued; the post
    /// is returned without waiting for it.
    pub async fn create(
        &self,
        user_id: i64,
        request_id: &RequestId,
        input: CreatePostInput,
    ) -> Result<Post> {
        input.validate()?;

        let project = self
            .project_repo
            .find_owned(user_id, input.project_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No project found with id {}", input.project_id))
            })?;

        let post = self.post_repo.create(&input).await?;
        tracing::info!(post_id = post.id, project_id = project.id, "Post created");

        if let Some((provider, url)) = project.webhook_target() {
            self.webhook_publisher.dispatch(WebhookEvent {
                provider,
                target_url: url.to_string(),
                post: post.clone(),
                request_id: request_id.clone(),
            });
        }

        Ok(post)
    }

    pub async fn list(
        &self,
        user_id: i64,
        project_id: Option<i64>,
        spec: &PaginationSpec,
    ) -> Result<Page<Post>> {
        let project_id = project_id
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Validation("project_id is required".to_string()))?;

        self.project_repo
            .find_owned(user_id, project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No project found with id {}", project_id)))?;

        self.post_repo.list_by_project(project_id, spec).await
    }
}
