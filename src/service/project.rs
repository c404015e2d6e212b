//! Project business logic

use crate::domain::{CheckSlugQuery, Page, PaginationSpec, Project, ProjectInput};
use crate::error::{AppError, Result};
use crate::repository::ProjectRepository;
use std::sync::Arc;
use validator::Validate;

pub struct ProjectService<P: ProjectRepository> {
    project_repo: Arc<P>,
}

impl<P: ProjectRepository> ProjectService<P> {
    pub fn new(project_repo: Arc<P>) -> Self {
        Self { project_repo }
    }

    pub async fn create(&self, user_id: i64, input: ProjectInput) -> Result<Project> {
        input.validate()?;

        if self.project_repo.slug_exists(&input.slug).await? {
            tracing::warn!(slug = %input.slug, "Slug already registered");
            return Err(AppError::Conflict("Slug already registered".to_string()));
        }

        let project = self.project_repo.create(user_id, &input).await?;
        tracing::info!(project_id = project.id, user_id, "Project created");
        Ok(project)
    }

    pub async fn list(&self, user_id: i64, spec: &PaginationSpec) -> Result<Page<Project>> {
        self.project_repo.list(user_id, spec).await
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Project> {
        self.project_repo
            .find_owned(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No project found with id {}", id)))
    }

    pub async fn update(&self, user_id: i64, id: i64, input: ProjectInput) -> Result<Project> {
        input.validate()?;

        let existing = self.get(user_id, id).await?;
        if existing.slug != input.slug && self.project_repo.slug_exists(&input.slug).await? {
            return Err(AppError::Conflict("Slug already registered".to_string()));
        }

        self.project_repo.update(user_id, id, &input).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.project_repo.delete(user_id, id).await?;
        tracing::info!(project_id = id, user_id, "Project deleted");
        Ok(())
    }

    pub async fn check_slug(&self, query: CheckSlugQuery) -> Result<bool> {
        query.validate()?;
        self.project_repo.slug_exists(&query.slug).await
    }
}
