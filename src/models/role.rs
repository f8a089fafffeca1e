//! Role model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default role assigned to newly registered users.
pub const ROLE_USER: &str = "user";
/// Role allowed to edit and delete other users' articles and comments.
pub const ROLE_MODERATOR: &str = "moderator";
/// Role with full access, including user and role management.
pub const ROLE_ADMINISTRATOR: &str = "administrator";

/// A role entity. Roles are opaque labels attached to users; permission
/// checks compare against the builtin role names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    /// Builtin roles are seeded by migration and cannot be renamed or deleted.
    pub is_builtin: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_role_names_are_distinct() {
        assert_ne!(ROLE_USER, ROLE_MODERATOR);
        assert_ne!(ROLE_MODERATOR, ROLE_ADMINISTRATOR);
        assert_ne!(ROLE_USER, ROLE_ADMINISTRATOR);
    }

    #[test]
    fn test_role_serializes_builtin_flag() {
        let role = Role {
            id: 1,
            name: "editor".to_string(),
            is_builtin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["name"], "editor");
        assert_eq!(json["is_builtin"], false);
    }
}
