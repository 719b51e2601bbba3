//! Models for password reset functionality.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Password resets expire five days after creation.
pub const RESET_TTL_SECS: i64 = 5 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Stored representation of a password reset request.
pub struct PassReset {
    /// Reset identifier; also the secret embedded in the reset URL.
    pub uuid: String,
    pub email: String,
    /// Identifier of the user the reset is for.
    pub user: String,
    #[serde(rename = "resetURL", default, skip_serializing_if = "String::is_empty")]
    pub reset_url: String,
    pub expiry: i64,
    pub last_modified: i64,
    pub created_on: i64,
    pub used: bool,
}

impl PassReset {
    /// Expired resets that were never used are removed by the daily sweep.
    pub fn is_stale(&self, now: i64) -> bool {
        now > self.expiry && !self.used
    }

    /// Removes the reset URL before the record is returned to a caller.
    pub fn sanitize(&mut self) {
        self.reset_url.clear();
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
/// Payload for requesting a password reset.
pub struct CreatePassResetPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "User is required"))]
    pub user: String,
}
