//! Models for service usage invitations.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::Role;

/// Invitations expire seven days after creation.
pub const INVITE_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Cancelled,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub uuid: String,
    pub email: String,
    pub role: Role,
    pub status: InviteStatus,
    pub last_modified: i64,
    pub created_on: i64,
    pub expiry: i64,
    /// Identifier of the user who issued the invitation.
    pub invited_by: String,
    pub deleted: bool,
}

impl Invite {
    /// Stale invitations are removed by the daily sweep: expired ones that
    /// are no longer pending, and cancelled ones regardless of expiry.
    pub fn is_stale(&self, now: i64) -> bool {
        (now > self.expiry && self.status != InviteStatus::Pending)
            || self.status == InviteStatus::Cancelled
    }

    /// Case-insensitive match on email, inviter or role.
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.email.to_lowercase().contains(&term)
            || self.invited_by.to_lowercase().contains(&term)
            || self.role.as_str().contains(&term)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitePayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub role: Role,
    #[validate(length(min = 1, message = "Inviter is required"))]
    pub invited_by: String,
}

/// Fields an administrator may change on an invitation. At least one must be
/// present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInvitePayload {
    pub role: Option<Role>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub status: Option<InviteStatus>,
}

impl UpdateInvitePayload {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.email.is_none() && self.status.is_none()
    }
}
