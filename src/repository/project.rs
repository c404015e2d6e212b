//! Project repository

use crate::domain::{Page, PaginationSpec, Project, ProjectInput};
use crate::error::{AppError, Result};
use crate::query::{
    BaseQuery, FieldValue, Listing, MySqlExecutor, Predicate, QueryEngine, Record,
    SearchAllClause,
};
use async_trait::async_trait;
use sqlx::MySqlPool;

pub const PROJECT_SEARCH: SearchAllClause =
    SearchAllClause::new(&["projects.name", "projects.slug"]);

impl Listing for Project {
    const SOURCE: &'static str = "projects";
    const SELECT: &'static str = "projects.id, projects.user_id, projects.name, projects.slug, \
        projects.webhook_provider, projects.webhook_url, projects.created_at, projects.updated_at";
    const PRIMARY_KEY: &'static str = "projects.id";
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("id", "projects.id"),
        ("user_id", "projects.user_id"),
        ("name", "projects.name"),
        ("slug", "projects.slug"),
        ("webhook_provider", "projects.webhook_provider"),
        ("created_at", "projects.created_at"),
        ("updated_at", "projects.updated_at"),
    ];
}

impl Record for Project {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "projects.id" => Some(FieldValue::Int(self.id)),
            "projects.user_id" => Some(FieldValue::Int(self.user_id)),
            "projects.name" => Some(FieldValue::Text(self.name.clone())),
            "projects.slug" => Some(FieldValue::Text(self.slug.clone())),
            "projects.webhook_provider" => self.webhook_provider.clone().map(FieldValue::Text),
            "projects.created_at" => Some(FieldValue::Text(self.created_at.to_rfc3339())),
            "projects.updated_at" => self.updated_at.map(|t| FieldValue::Text(t.to_rfc3339())),
            _ => None,
        }
    }
}

/// Projects are always accessed on behalf of their owner; every lookup and
/// mutation is scoped by `user_id`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, user_id: i64, input: &ProjectInput) -> Result<Project>;
    async fn find_owned(&self, user_id: i64, id: i64) -> Result<Option<Project>>;
    async fn slug_exists(&self, slug: &str) -> Result<bool>;
    async fn update(&self, user_id: i64, id: i64, input: &ProjectInput) -> Result<Project>;
    async fn delete(&self, user_id: i64, id: i64) -> Result<()>;
    async fn list(&self, user_id: i64, spec: &PaginationSpec) -> Result<Page<Project>>;
}

pub struct ProjectRepositoryImpl {
    pool: MySqlPool,
    engine: QueryEngine,
}

impl ProjectRepositoryImpl {
    pub fn new(pool: MySqlPool, engine: QueryEngine) -> Self {
        Self { pool, engine }
    }
}

#[async_trait]
impl ProjectRepository for ProjectRepositoryImpl {
    async fn create(&self, user_id: i64, input: &ProjectInput) -> Result<Project> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (user_id, name, slug, webhook_provider, webhook_url, created_at)
            VALUES (?, ?, ?, ?, ?, NOW())
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.webhook_provider())
        .bind(input.webhook_url())
        .execute(&self.pool)
        .await
        .map_err(map_duplicate_slug)?;

        self.find_owned(user_id, result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create project")))
    }

    async fn find_owned(&self, user_id: i64, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, user_id, name, slug, webhook_provider, webhook_url,
                   created_at, updated_at
            FROM projects
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM projects WHERE slug = ? LIMIT 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn update(&self, user_id: i64, id: i64, input: &ProjectInput) -> Result<Project> {
        self.find_owned(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No project found with id {}", id)))?;

        sqlx::query(
            r#"
            UPDATE projects
            SET name = ?, slug = ?, webhook_provider = ?, webhook_url = ?, updated_at = NOW()
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.webhook_provider())
        .bind(input.webhook_url())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_duplicate_slug)?;

        self.find_owned(user_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No project found with id {}", id)))
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No project found with id {}", id)));
        }

        Ok(())
    }

    async fn list(&self, user_id: i64, spec: &PaginationSpec) -> Result<Page<Project>> {
        let executor = MySqlExecutor::new(self.pool.clone());
        let base = BaseQuery::<Project>::new().filter(Predicate::eq("projects.user_id", user_id));
        let page = self
            .engine
            .paginate(&executor, base, spec, Some(&PROJECT_SEARCH))
            .await?;
        Ok(page)
    }
}

fn map_duplicate_slug(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.code().as_deref() == Some("1062") {
            return AppError::Conflict("Slug already registered".to_string());
        }
    }
    AppError::Database(error)
}
