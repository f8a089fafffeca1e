//! Per-entity repositories
//!
//! Each repository is a trait with a sqlx-backed implementation that
//! dispatches on the pool driver (SQLite or MySQL).

pub mod article;
pub mod comment;
pub mod role;
pub mod session;
pub mod tag;
pub mod user;

pub use article::{ArticleRepository, NewArticle, SqlxArticleRepository};
pub use comment::{CommentRepository, NewComment, SqlxCommentRepository};
pub use role::{RoleRepository, SqlxRoleRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use tag::{NewTag, SqlxTagRepository, TagRepository};
pub use user::{NewUser, SqlxUserRepository, UserRepository};
