//! Domain models for LogStream Core

pub mod pagination;
pub mod post;
pub mod project;
pub mod user;

pub use pagination::*;
pub use post::*;
pub use project::*;
pub use user::*;
