//! Models that represent users, login payloads, and access levels.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Stored representation of a user account.
pub struct User {
    /// Identifier derived from the user's email address.
    pub uuid: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 hash of the user's password. Cleared by [`User::sanitize`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub email: String,
    /// Access level granted to sessions created for this user.
    pub role: Role,
    pub last_login: i64,
    pub last_modified: i64,
    pub created_on: i64,
    pub deleted: bool,
    /// Invitation the account was registered from (`-` for the bootstrap admin).
    pub invite: String,
}

impl User {
    /// Removes sensitive fields before the user is returned to a caller.
    pub fn sanitize(&mut self) {
        self.password.clear();
    }

    /// Case-insensitive match on email or role.
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.email.to_lowercase().contains(&term) || self.role.as_str().contains(&term)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Access levels carried by users, invitations and sessions.
pub enum Role {
    /// Unrestricted access; satisfies every role requirement.
    Admin,
    #[default]
    Management,
    Finance,
}

impl Role {
    /// Returns the canonical lowercase representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Management => "management",
            Role::Finance => "finance",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "management" => Ok(Role::Management),
            "finance" => Ok(Role::Finance),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["admin", "management", "finance"],
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
/// Credentials exchanged for a session.
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration against a pending invitation. The role comes from the
/// invitation.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "Invitation is required"))]
    pub invite: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Profile changes. A password change needs both the current and the new
/// password.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDetailsPayload {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

impl UpdateUserDetailsPayload {
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRolePayload {
    pub role: Role,
}

/// Sets a new password by consuming a password reset.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetUserPasswordPayload {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Reset is required"))]
    pub reset_id: String,
}
