//! User and session models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::{ROLE_ADMINISTRATOR, ROLE_MODERATOR};

/// A user account.
///
/// The role name is joined in from the roles table so permission checks
/// never need a second lookup. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    pub password_hash: String,
    pub role_id: i64,
    /// Name of the user's role, joined from the roles table.
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the user holds the administrator role
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMINISTRATOR
    }

    /// Check if the user holds an elevated role (administrator or moderator)
    pub fn is_moderator(&self) -> bool {
        self.role == ROLE_ADMINISTRATOR || self.role == ROLE_MODERATOR
    }

    /// Check if the user may edit or delete content owned by `owner_id`.
    ///
    /// Owners can always edit their own content; administrators and
    /// moderators can edit anyone's.
    pub fn can_edit(&self, owner_id: i64) -> bool {
        self.id == owner_id || self.is_moderator()
    }

    /// Display name: "First Last" when set, username otherwise
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{} {}", first, last)
            }
            (Some(first), _) if !first.is_empty() => first.clone(),
            _ => self.username.clone(),
        }
    }
}

/// Input for updating an existing user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    /// New plaintext password, re-hashed before storage
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub about: Option<String>,
    /// New role name; must name an existing role
    pub role: Option<String>,
}

/// An authentication session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Random session token
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::ROLE_USER;
    use chrono::Duration;

    fn user_with_role(id: i64, role: &str) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            password_hash: "$argon2id$test".to_string(),
            role_id: 1,
            role: role.to_string(),
            first_name: None,
            last_name: None,
            about: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_has_all_permissions() {
        let admin = user_with_role(1, ROLE_ADMINISTRATOR);
        assert!(admin.is_admin());
        assert!(admin.is_moderator());
        assert!(admin.can_edit(999));
    }

    #[test]
    fn test_moderator_can_edit_others_but_is_not_admin() {
        let moderator = user_with_role(2, ROLE_MODERATOR);
        assert!(!moderator.is_admin());
        assert!(moderator.is_moderator());
        assert!(moderator.can_edit(999));
    }

    #[test]
    fn test_regular_user_can_only_edit_own_content() {
        let user = user_with_role(3, ROLE_USER);
        assert!(!user.is_admin());
        assert!(!user.is_moderator());
        assert!(user.can_edit(3));
        assert!(!user.can_edit(4));
    }

    #[test]
    fn test_unknown_role_gets_no_elevated_permissions() {
        let user = user_with_role(5, "editor");
        assert!(!user.is_admin());
        assert!(!user.is_moderator());
        assert!(user.can_edit(5));
        assert!(!user.can_edit(1));
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let mut user = user_with_role(1, ROLE_USER);
        assert_eq!(user.display_name(), "user1");

        user.first_name = Some("Ada".to_string());
        assert_eq!(user.display_name(), "Ada");

        user.last_name = Some("Lovelace".to_string());
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_session_expiry() {
        let mut session = Session {
            id: "token".to_string(),
            user_id: 1,
            expires_at: Utc::now() + Duration::hours(1),
            created_at: Utc::now(),
        };
        assert!(!session.is_expired());

        session.expires_at = Utc::now() - Duration::hours(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = user_with_role(1, ROLE_USER);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }
}
