//! Business logic layer

pub mod auth;
pub mod post;
pub mod project;
pub mod user;
pub mod webhook;

pub use auth::{AuthService, LoginOutcome};
pub use post::PostService;
pub use project::ProjectService;
pub use user::UserService;
pub use webhook::{WebhookDispatcher, WebhookEvent, WebhookPublisher, WebhookSupervisor};
