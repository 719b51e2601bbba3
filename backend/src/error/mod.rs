use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::db::StoreError;

/// Outcomes of session validation, entity lookups and storage access.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authorization header not found")]
    AuthorizationMissing,
    #[error("unexpected authorization type")]
    AuthorizationMalformed,
    #[error("unauthorized access")]
    Unauthorized,
    #[error("expired session")]
    SessionExpired,
    #[error("malformed request")]
    MalformedRequestBody,
    #[error("malformed payload")]
    MalformedPayload,
    #[error("associated value for '{0}' not found")]
    KeyNotFound(String),
    #[error("invalid parameter type for '{0}'")]
    InvalidParameter(String),
    #[error("functionality not applicable to entity '{0}'")]
    NotApplicable(String),
    #[error("parameters '{0}' are expected together in a request")]
    ParameterGroup(String),
    #[error("supplied keys do not update entity")]
    NoUpdate,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password reset has already been used")]
    ResetUsed,
    #[error("password reset has already expired")]
    ResetExpired,
    #[error("invite expired")]
    InviteExpired,
    #[error("invite is no longer pending")]
    InviteClosed,
    #[error("invite not associated with user being created")]
    InviteMismatch,
    #[error("a record already exists for '{0}'")]
    AlreadyExists(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Conflict(String),
    BadRequest(String),
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT".to_string(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::AuthorizationMissing
            | Error::AuthorizationMalformed
            | Error::Unauthorized
            | Error::SessionExpired => AppError::Unauthorized(err.to_string()),
            Error::MalformedRequestBody
            | Error::MalformedPayload
            | Error::InvalidParameter(_)
            | Error::NotApplicable(_)
            | Error::ParameterGroup(_)
            | Error::NoUpdate
            | Error::PasswordMismatch
            | Error::ResetUsed
            | Error::ResetExpired
            | Error::InviteExpired
            | Error::InviteClosed
            | Error::InviteMismatch => AppError::BadRequest(err.to_string()),
            Error::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            Error::KeyNotFound(_) => AppError::NotFound(err.to_string()),
            Error::Storage(store) => AppError::InternalServerError(store.into()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::InternalServerError(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let code = e.code.as_ref();
                    format!("{}: {}", field, code)
                })
            })
            .collect();
        AppError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn session_errors_map_to_unauthorized() {
        for (err, message) in [
            (Error::AuthorizationMissing, "authorization header not found"),
            (Error::AuthorizationMalformed, "unexpected authorization type"),
            (Error::Unauthorized, "unauthorized access"),
            (Error::SessionExpired, "expired session"),
        ] {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let json = response_json(response).await;
            assert_eq!(json["error"], message);
            assert_eq!(json["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn payload_errors_map_to_bad_request() {
        let response = AppError::from(Error::MalformedPayload).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "malformed payload");

        let response = AppError::from(Error::NotApplicable("session".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "functionality not applicable to entity 'session'");
    }

    #[tokio::test]
    async fn rule_violations_map_to_bad_request_and_conflict() {
        let response = AppError::from(Error::ResetUsed).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "password reset has already been used");

        let response = AppError::from(Error::AlreadyExists("dUBleA".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn key_not_found_maps_to_not_found() {
        let response = AppError::from(Error::KeyNotFound("abc".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"], "associated value for 'abc' not found");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn storage_failure_maps_to_generic_message() {
        let err = Error::Storage(StoreError::BucketNotFound("log/x".into()));
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert!(json["details"].is_null());
    }

    #[tokio::test]
    async fn app_error_validation_includes_details() {
        let response = AppError::Validation(vec!["email: email".to_string()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Validation failed");
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["errors"][0], "email: email");
    }
}
