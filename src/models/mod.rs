//! Domain models

pub mod article;
pub mod comment;
pub mod role;
pub mod tag;
pub mod user;

pub use article::{Article, ArticleDetail, CreateArticleInput, UpdateArticleInput};
pub use comment::{Comment, CommentWithAuthor, CreateCommentInput};
pub use role::{Role, ROLE_ADMINISTRATOR, ROLE_MODERATOR, ROLE_USER};
pub use tag::{CreateTagInput, Tag, UpdateTagInput};
pub use user::{Session, UpdateUserInput, User};
