use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One validated request, appended to the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLog {
    /// Caller address.
    pub origin: String,
    /// Session token of the requester.
    pub requestor: String,
    /// HTTP method.
    #[serde(rename = "type")]
    pub request_type: String,
    pub route: String,
    /// Query parameters, form-encoded and sorted by key.
    pub query_params: String,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Filters for listing a day's audit trail.
pub struct ListRequestLogPayload {
    /// Any moment of the day to list, `YYYY-MM-DD hh:mm:ss`.
    pub date: String,
    /// Restrict to one requestor token.
    #[serde(default)]
    pub requestor: Option<String>,
    /// Restrict to one HTTP method (case-insensitive).
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub offset: u32,
}
