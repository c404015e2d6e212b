//! Data access layer (Repository pattern)

pub mod post;
pub mod project;
pub mod user;

pub use post::{PostRepository, PostRepositoryImpl, POST_SEARCH};
pub use project::{ProjectRepository, ProjectRepositoryImpl, PROJECT_SEARCH};
pub use user::{UserRepository, UserRepositoryImpl, USER_SEARCH};
