//! In-memory repositories shared by the API tests
//!
//! Listings go through the production `QueryEngine` with a `MemoryExecutor`,
//! so pagination, search and ordering behave exactly as they do over MySQL.


use async_trait::async_trait;
use chrono::Utc;
use logstream_core::config::JwtConfig;
use logstream_core::domain::{
    CreatePostInput, Page, PaginationSpec, Post, Project, ProjectInput, User,
};
use logstream_core::error::{AppError, Result};
use logstream_core::jwt::JwtManager;
use logstream_core::query::{BaseQuery, MemoryExecutor, Predicate, QueryEngine};
use logstream_core::repository::{
    PostRepository, ProjectRepository, UserRepository, POST_SEARCH, PROJECT_SEARCH, USER_SEARCH,
};
use logstream_core::service::{WebhookEvent, WebhookPublisher};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::RwLock;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-http-testing";

pub fn create_test_jwt_manager() -> JwtManager {
    JwtManager::new(JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        token_ttl_secs: 3600,
    })
}

fn test_engine() -> QueryEngine {
    QueryEngine::new(Duration::from_secs(5))
}

// ============================================================================
// Users
// ============================================================================

pub struct TestUserRepository {
    users: RwLock<Vec<User>>,
    engine: QueryEngine,
}

impl TestUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(vec![]),
            engine: test_engine(),
        }
    }

    /// Insert a user as-is, assigning the next id when `user.id` is 0.
    pub async fn add_user(&self, mut user: User) -> User {
        let mut users = self.users.write().await;
        if user.id == 0 {
            user.id = users.len() as i64 + 1;
        }
        users.push(user.clone());
        user
    }
}

impl Default for TestUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let user = User {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_admin: false,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list(&self, spec: &PaginationSpec) -> Result<Page<User>> {
        let executor = MemoryExecutor::new(self.users.read().await.clone());
        let page = self
            .engine
            .paginate(&executor, BaseQuery::<User>::new(), spec, Some(&USER_SEARCH))
            .await?;
        Ok(page)
    }
}

// ============================================================================
// Projects
// ============================================================================

pub struct TestProjectRepository {
    projects: RwLock<Vec<Project>>,
    engine: QueryEngine,
}

impl TestProjectRepository {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(vec![]),
            engine: test_engine(),
        }
    }

    pub async fn add_project(&self, mut project: Project) -> Project {
        let mut projects = self.projects.write().await;
        if project.id == 0 {
            project.id = projects.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        }
        projects.push(project.clone());
        project
    }

    pub async fn count(&self) -> usize {
        self.projects.read().await.len()
    }
}

impl Default for TestProjectRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectRepository for TestProjectRepository {
    async fn create(&self, user_id: i64, input: &ProjectInput) -> Result<Project> {
        let mut projects = self.projects.write().await;
        if projects.iter().any(|p| p.slug == input.slug) {
            return Err(AppError::Conflict("Slug already registered".to_string()));
        }
        let project = Project {
            id: projects.iter().map(|p| p.id).max().unwrap_or(0) + 1,
            user_id,
            name: input.name.clone(),
            slug: input.slug.clone(),
            webhook_provider: input.webhook_provider().map(str::to_string),
            webhook_url: input.webhook_url().map(str::to_string),
            created_at: Utc::now(),
            updated_at: None,
        };
        projects.push(project.clone());
        Ok(project)
    }

    async fn find_owned(&self, user_id: i64, id: i64) -> Result<Option<Project>> {
        let projects = self.projects.read().await;
        Ok(projects
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let projects = self.projects.read().await;
        Ok(projects.iter().any(|p| p.slug == slug))
    }

    async fn update(&self, user_id: i64, id: i64, input: &ProjectInput) -> Result<Project> {
        let mut projects = self.projects.write().await;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id && p.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("No project found with id {}", id)))?;
        project.name = input.name.clone();
        project.slug = input.slug.clone();
        project.webhook_provider = input.webhook_provider().map(str::to_string);
        project.webhook_url = input.webhook_url().map(str::to_string);
        project.updated_at = Some(Utc::now());
        Ok(project.clone())
    }

    async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        let mut projects = self.projects.write().await;
        let before = projects.len();
        projects.retain(|p| !(p.id == id && p.user_id == user_id));
        if projects.len() == before {
            return Err(AppError::NotFound(format!("No project found with id {}", id)));
        }
        Ok(())
    }

    async fn list(&self, user_id: i64, spec: &PaginationSpec) -> Result<Page<Project>> {
        let executor = MemoryExecutor::new(self.projects.read().await.clone());
        let base = BaseQuery::<Project>::new().filter(Predicate::eq("projects.user_id", user_id));
        let page = self
            .engine
            .paginate(&executor, base, spec, Some(&PROJECT_SEARCH))
            .await?;
        Ok(page)
    }
}

// ============================================================================
// Posts
// ============================================================================

pub struct TestPostRepository {
    posts: RwLock<Vec<Post>>,
    engine: QueryEngine,
}

impl TestPostRepository {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(vec![]),
            engine: test_engine(),
        }
    }

    pub async fn add_post(&self, mut post: Post) -> Post {
        let mut posts = self.posts.write().await;
        if post.id == 0 {
            post.id = posts.len() as i64 + 1;
        }
        posts.push(post.clone());
        post
    }

    pub async fn count(&self) -> usize {
        self.posts.read().await.len()
    }
}

impl Default for TestPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for TestPostRepository {
    async fn create(&self, input: &CreatePostInput) -> Result<Post> {
        let mut posts = self.posts.write().await;
        let post = Post {
            id: posts.len() as i64 + 1,
            project_id: input.project_id,
            title: input.title.clone(),
            content: input.content.clone(),
            category: input.category.clone(),
            status: input.status.clone(),
            created_at: Utc::now(),
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_project(&self, project_id: i64, spec: &PaginationSpec) -> Result<Page<Post>> {
        let executor = MemoryExecutor::new(self.posts.read().await.clone());
        let base = BaseQuery::<Post>::new().filter(Predicate::eq("posts.project_id", project_id));
        let page = self
            .engine
            .paginate(&executor, base, spec, Some(&POST_SEARCH))
            .await?;
        Ok(page)
    }
}

// ============================================================================
// Webhooks
// ============================================================================

/// Publisher that only remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<WebhookEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<WebhookEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl WebhookPublisher for RecordingPublisher {
    fn dispatch(&self, event: WebhookEvent) {
        self.events.lock().unwrap().push(event);
    }
}
