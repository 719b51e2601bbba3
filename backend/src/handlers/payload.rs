//! Request body decoding shared by the handlers.

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use validator::Validate;

use crate::{
    error::{AppError, Error},
    models::ListPayload,
};

/// Decodes a JSON body. An empty or syntactically broken body is a malformed
/// payload; a well-formed body with missing or mistyped fields is reported
/// with serde's message.
pub fn parse_payload<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    if body.is_empty() {
        return Err(Error::MalformedPayload.into());
    }
    serde_json::from_slice(body).map_err(|err| match err.classify() {
        Category::Data => AppError::BadRequest(err.to_string()),
        Category::Io | Category::Syntax | Category::Eof => Error::MalformedPayload.into(),
    })
}

/// [`parse_payload`] followed by the payload's own validation rules.
pub fn parse_validated<T: DeserializeOwned + Validate>(body: &Bytes) -> Result<T, AppError> {
    let payload: T = parse_payload(body)?;
    payload.validate()?;
    Ok(payload)
}

/// Listing bodies are optional; an empty body asks for the first page of
/// everything.
pub fn parse_list_payload(body: &Bytes) -> Result<ListPayload, AppError> {
    if body.is_empty() {
        Ok(ListPayload::default())
    } else {
        parse_payload(body)
    }
}
