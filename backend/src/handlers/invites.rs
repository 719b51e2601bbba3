use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Error},
    models::{
        invite::{CreateInvitePayload, Invite, InviteStatus, UpdateInvitePayload, INVITE_TTL_SECS},
        DeletePayload, ListResponse, PageWindow,
    },
    repositories::{invite as invite_repo, user as user_repo},
    state::AppState,
    utils::{time::unix_now, token::generate_record_id},
};

pub async fn create_invite(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Invite>), AppError> {
    let payload: CreateInvitePayload = super::parse_validated(&body)?;

    let inviter = user_repo::get_user(&state.store, &payload.invited_by)
        .await?
        .filter(|user| !user.deleted);
    if inviter.is_none() {
        return Err(AppError::BadRequest(
            Error::KeyNotFound("invitedBy".into()).to_string(),
        ));
    }

    let now = unix_now();
    let invite = Invite {
        uuid: generate_record_id(),
        email: payload.email.trim().to_lowercase(),
        role: payload.role,
        status: InviteStatus::Pending,
        last_modified: now,
        created_on: now,
        expiry: now + INVITE_TTL_SECS,
        invited_by: payload.invited_by,
        deleted: false,
    };

    if !invite_repo::create_invite(&state.store, &invite).await? {
        return Err(AppError::Conflict(
            "An invitation for this email already exists".into(),
        ));
    }
    tracing::info!(invite = %invite.uuid, role = %invite.role, "Invitation created");
    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn get_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<String>,
) -> Result<Json<Invite>, AppError> {
    let invite = invite_repo::get_invite(&state.store, &invite_id)
        .await?
        .ok_or(Error::KeyNotFound(invite_id))?;
    Ok(Json(invite))
}

/// Marks an invitation cancelled; the next invite sweep removes it.
pub async fn cancel_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<String>,
) -> Result<Json<Invite>, AppError> {
    let invite = invite_repo::cancel_invite(&state.store, &invite_id, unix_now())
        .await?
        .ok_or(Error::KeyNotFound(invite_id))?;
    Ok(Json(invite))
}

pub async fn update_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<String>,
    body: Bytes,
) -> Result<Json<Invite>, AppError> {
    let payload: UpdateInvitePayload = super::parse_validated(&body)?;
    if payload.is_empty() {
        return Err(Error::NoUpdate.into());
    }

    let invite = invite_repo::update_invite(&state.store, &invite_id, &payload, unix_now())
        .await?
        .ok_or(Error::KeyNotFound(invite_id))?;
    Ok(Json(invite))
}

pub async fn delete_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let payload: DeletePayload = super::parse_payload(&body)?;
    invite_repo::set_deleted(&state.store, &invite_id, payload.deleted, unix_now())
        .await?
        .ok_or(Error::KeyNotFound(invite_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_invites(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ListResponse<Invite>>, AppError> {
    let payload = super::parse_list_payload(&body)?;
    let window = PageWindow::new(state.page_limit(), payload.offset);
    let invites = invite_repo::list_invites(&state.store, payload.term(), window).await?;
    Ok(Json(ListResponse::new(invites, window)))
}
