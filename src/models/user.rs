//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User account stored in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable user ID (UUID), used as the owner key of contacts
    pub id: String,
    pub username: String,
    /// Login email (unique across users)
    pub email: String,
    /// Self-salted bcrypt hash, never the plaintext
    pub password_hash: String,
    /// When the account was created (RFC3339)
    pub created_at: String,
    /// Last issued refresh token, cleared on logout or replay
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Avatar image URL
    #[serde(default)]
    pub avatar: Option<String>,
    /// Set once the email address has been verified
    #[serde(default)]
    pub confirmed: bool,
}

/// Public view of a user (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at.clone(),
            avatar: user.avatar.clone(),
            confirmed: user.confirmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_omits_credentials() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            refresh_token: Some("refresh".to_string()),
            avatar: None,
            confirmed: true,
        };

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(json["email"], "a@b.com");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
    }
}
