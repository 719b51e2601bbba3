//! Models for authenticated sessions.

use serde::{Deserialize, Serialize};

use super::user::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A bearer session issued to an authenticated user.
pub struct Session {
    /// Identifier of the user the session belongs to.
    pub user: String,
    /// Unguessable bearer token; the session cache key.
    pub token: String,
    /// Access level used for authorization decisions.
    pub access: Role,
    /// Creation time, seconds since the Unix epoch.
    pub created_on: i64,
    /// Absolute expiry, seconds since the Unix epoch. Slides forward on
    /// every authorized request.
    pub expiry: i64,
}

impl Session {
    /// A session whose expiry is at or before `now` is dead, whether or not
    /// it is still cached.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiry <= now
    }
}
