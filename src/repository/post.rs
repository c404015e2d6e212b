//! Post repository

use crate::domain::{CreatePostInput, Page, PaginationSpec, Post};
use crate::error::{AppError, Result};
use crate::query::{
    BaseQuery, FieldValue, Listing, MySqlExecutor, Predicate, QueryEngine, Record,
    SearchAllClause,
};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Searches post text as well as the owning project's name and slug.
pub const POST_SEARCH: SearchAllClause = SearchAllClause::new(&[
    "posts.title",
    "posts.category",
    "projects.name",
    "projects.slug",
]);

impl Listing for Post {
    const SOURCE: &'static str = "posts INNER JOIN projects ON projects.id = posts.project_id";
    const SELECT: &'static str = "posts.id, posts.project_id, posts.title, posts.content, \
        posts.category, posts.status, posts.created_at";
    const PRIMARY_KEY: &'static str = "posts.id";
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("id", "posts.id"),
        ("project_id", "posts.project_id"),
        ("title", "posts.title"),
        ("content", "posts.content"),
        ("category", "posts.category"),
        ("status", "posts.status"),
        ("created_at", "posts.created_at"),
        ("project_name", "projects.name"),
        ("project_slug", "projects.slug"),
    ];
}

impl Record for Post {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "posts.id" => Some(FieldValue::Int(self.id)),
            "posts.project_id" => Some(FieldValue::Int(self.project_id)),
            "posts.title" => Some(FieldValue::Text(self.title.clone())),
            "posts.content" => Some(FieldValue::Text(self.content.clone())),
            "posts.category" => Some(FieldValue::Text(self.category.clone())),
            "posts.status" => Some(FieldValue::Text(self.status.clone())),
            "posts.created_at" => Some(FieldValue::Text(self.created_at.to_rfc3339())),
            // Joined columns are not carried on the row.
            _ => None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, input: &CreatePostInput) -> Result<Post>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>>;
    async fn list_by_project(&self, project_id: i64, spec: &PaginationSpec) -> Result<Page<Post>>;
}

pub struct PostRepositoryImpl {
    pool: MySqlPool,
    engine: QueryEngine,
}

impl PostRepositoryImpl {
    pub fn new(pool: MySqlPool, engine: QueryEngine) -> Self {
        Self { pool, engine }
    }
}

#[async_trait]
impl PostRepository for PostRepositoryImpl {
    async fn create(&self, input: &CreatePostInput) -> Result<Post> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (project_id, title, content, category, status, created_at)
            VALUES (?, ?, ?, ?, ?, NOW())
            "#,
        )
        .bind(input.project_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.category)
        .bind(&input.status)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create post")))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, project_id, title, content, category, status, created_at
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_by_project(&self, project_id: i64, spec: &PaginationSpec) -> Result<Page<Post>> {
        let executor = MySqlExecutor::new(self.pool.clone());
        let base = BaseQuery::<Post>::new().filter(Predicate::eq("posts.project_id", project_id));
        let page = self
            .engine
            .paginate(&executor, base, spec, Some(&POST_SEARCH))
            .await?;
        Ok(page)
    }
}
