//! Session gate for privileged routes.

use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::user::Role,
    services::session::{AccessRequest, RequestBody},
    state::AppState,
};

/// Largest request body buffered for validation.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const FORWARDED_FOR: &str = "x-forwarded-for";

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Admin, Role::Management, Role::Finance];

/// Roles a group of routes requires, paired with the state the check needs.
#[derive(Clone)]
pub struct AccessPolicy {
    pub state: AppState,
    pub roles: &'static [Role],
}

impl AccessPolicy {
    pub fn new(state: AppState, roles: &'static [Role]) -> Self {
        Self { state, roles }
    }
}

/// Validates the request's session against the policy's roles. On success
/// the renewed [`Session`](crate::models::session::Session) is added to the
/// request extensions and the buffered body is handed on unchanged.
pub async fn require_roles(
    State(policy): State<AccessPolicy>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => RequestBody::Bytes(bytes),
        Err(err) => RequestBody::Unreadable(err.to_string()),
    };

    let access = AccessRequest {
        origin: request_origin(&parts),
        method: parts.method.to_string(),
        route: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    };

    let validated = policy
        .state
        .sessions
        .validate_request(policy.roles, &access)
        .await?;

    let replay = match access.body {
        RequestBody::Bytes(bytes) => bytes,
        RequestBody::Unreadable(_) => Bytes::new(),
    };
    let mut request = Request::from_parts(parts, Body::from(replay));
    request.extensions_mut().insert(validated.session);
    Ok(next.run(request).await)
}

fn request_origin(parts: &Parts) -> String {
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.to_string();
    }
    parts
        .headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
