//! User repository

use crate::domain::{Page, PaginationSpec, User};
use crate::error::{AppError, Result};
use crate::query::{
    BaseQuery, FieldValue, Listing, MySqlExecutor, QueryEngine, Record, SearchAllClause,
};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Free-text search over user listings.
pub const USER_SEARCH: SearchAllClause = SearchAllClause::new(&["users.email"]);

impl Listing for User {
    const SOURCE: &'static str = "users";
    const SELECT: &'static str =
        "users.id, users.email, users.password_hash, users.is_admin, users.created_at";
    const PRIMARY_KEY: &'static str = "users.id";
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("id", "users.id"),
        ("email", "users.email"),
        ("created_at", "users.created_at"),
    ];
}

impl Record for User {
    fn field(&self, column: &str) -> Option<FieldValue> {
        match column {
            "users.id" => Some(FieldValue::Int(self.id)),
            "users.email" => Some(FieldValue::Text(self.email.clone())),
            "users.created_at" => Some(FieldValue::Text(self.created_at.to_rfc3339())),
            _ => None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Replace the stored hash. `NotFound` when no user has this email.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()>;
    async fn list(&self, spec: &PaginationSpec) -> Result<Page<User>>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
    engine: QueryEngine,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool, engine: QueryEngine) -> Self {
        Self { pool, engine }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, is_admin, created_at)
            VALUES (?, ?, FALSE, NOW())
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_duplicate_email)?;

        self.find_by_id(result.last_insert_id() as i64)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_admin, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let existing = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self, spec: &PaginationSpec) -> Result<Page<User>> {
        let executor = MySqlExecutor::new(self.pool.clone());
        let page = self
            .engine
            .paginate(&executor, BaseQuery::<User>::new(), spec, Some(&USER_SEARCH))
            .await?;
        Ok(page)
    }
}

fn map_duplicate_email(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.code().as_deref() == Some("1062") {
            return AppError::Conflict("Email already registered".to_string());
        }
    }
    AppError::Database(error)
}
