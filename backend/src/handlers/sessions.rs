use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, Error},
    models::{
        session::Session,
        user::{LoginRequest, Role},
    },
    repositories::user as user_repo,
    state::AppState,
    utils::{password::verify_password, time::unix_now},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Exchanges credentials for a new session.
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let payload: LoginRequest = super::parse_payload(&body)?;

    let user = user_repo::find_user_by_email(&state.store, &payload.email)
        .await?
        .filter(|user| !user.deleted)
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    if !verify_password(&payload.password, &user.password)? {
        tracing::debug!(user = %user.uuid, "Rejected login with wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    // Recorded before the session exists so a failed write leaves none behind.
    user_repo::update_last_login(&state.store, &user.uuid, unix_now())
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;
    let session = state.sessions.create_session(&user.uuid, user.role);
    tracing::info!(user = %user.uuid, access = %session.access, "User logged in");

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Session>, AppError> {
    Ok(Json(state.sessions.get_session(&token)?))
}

/// Ends a session. Callers may end their own session; admins may end any.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<Session>,
    Path(token): Path<String>,
) -> Result<Json<Value>, AppError> {
    if token != current.token && current.access != Role::Admin {
        return Err(Error::Unauthorized.into());
    }
    state
        .sessions
        .logout(&token)
        .ok_or(Error::KeyNotFound(token))?;
    Ok(Json(json!({ "message": "Session ended" })))
}
