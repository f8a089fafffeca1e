//! Domain services
//!
//! Services own validation, permission checks, and cross-repository
//! orchestration. Handlers call services and translate their errors
//! into HTTP responses.

pub mod article;
pub mod comment;
pub mod password;
pub mod role;
pub mod tag;
pub mod user;

pub use article::{ArticleService, ArticleServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use role::{RoleService, RoleServiceError};
pub use tag::{TagService, TagServiceError};
pub use user::{UserService, UserServiceError};
