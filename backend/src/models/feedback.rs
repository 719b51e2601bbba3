use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// User feedback about the service.
pub struct Feedback {
    pub uuid: String,
    pub details: String,
    /// Identifier of the submitting user.
    pub user: String,
    pub resolved: bool,
    pub created_on: i64,
    pub last_modified: i64,
}

impl Feedback {
    /// Case-insensitive match on the submitting user.
    pub fn matches_term(&self, term: &str) -> bool {
        self.user.to_lowercase().contains(&term.to_lowercase())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFeedbackPayload {
    #[validate(length(min = 1, max = 4096, message = "Feedback details are required"))]
    pub details: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFeedbackPayload {
    #[serde(default)]
    pub resolved: bool,
}
