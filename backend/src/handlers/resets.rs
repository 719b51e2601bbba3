use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Error},
    models::password_reset::{CreatePassResetPayload, PassReset, RESET_TTL_SECS},
    repositories::password_reset as reset_repo,
    state::AppState,
    utils::{time::unix_now, token::generate_record_id},
};

/// Opens a password reset. The reset URL is only stored; it never appears in
/// a response.
pub async fn create_reset(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<PassReset>), AppError> {
    let payload: CreatePassResetPayload = super::parse_validated(&body)?;

    let now = unix_now();
    let uuid = generate_record_id();
    let mut reset = PassReset {
        reset_url: format!("{}/#!/reset/{}", state.config.frontend_url, uuid),
        uuid,
        email: payload.email.trim().to_lowercase(),
        user: payload.user,
        expiry: now + RESET_TTL_SECS,
        last_modified: now,
        created_on: now,
        used: false,
    };
    reset_repo::put_reset(&state.store, &reset).await?;
    tracing::info!(reset = %reset.uuid, user = %reset.user, "Password reset opened");

    reset.sanitize();
    Ok((StatusCode::CREATED, Json(reset)))
}

pub async fn get_reset(
    State(state): State<AppState>,
    Path(reset_id): Path<String>,
) -> Result<Json<PassReset>, AppError> {
    let mut reset = reset_repo::get_reset(&state.store, &reset_id)
        .await?
        .ok_or(Error::KeyNotFound(reset_id))?;
    reset.sanitize();
    Ok(Json(reset))
}

pub async fn mark_reset_used(
    State(state): State<AppState>,
    Path(reset_id): Path<String>,
) -> Result<Json<PassReset>, AppError> {
    let mut reset = reset_repo::mark_reset_used(&state.store, &reset_id, unix_now())
        .await?
        .ok_or(Error::KeyNotFound(reset_id))?;
    reset.sanitize();
    Ok(Json(reset))
}
