use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Error},
    models::{
        user::{
            RegisterUserPayload, ResetUserPasswordPayload, UpdateUserDetailsPayload,
            UpdateUserRolePayload, User,
        },
        DeletePayload, ListResponse, PageWindow,
    },
    repositories::user as user_repo,
    state::AppState,
    utils::{
        password::{hash_password, verify_password},
        time::unix_now,
        token::user_id_for_email,
    },
};

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    let mut user = user_repo::get_user(&state.store, &user_id)
        .await?
        .ok_or(Error::KeyNotFound(user_id))?;
    user.sanitize();
    Ok(Json(user))
}

/// Registers an account from a pending invitation and accepts the
/// invitation.
pub async fn register_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<User>), AppError> {
    let payload: RegisterUserPayload = super::parse_validated(&body)?;

    let now = unix_now();
    let email = payload.email.trim().to_lowercase();
    let user = User {
        uuid: user_id_for_email(&email),
        first_name: payload.first_name,
        last_name: payload.last_name,
        password: hash_password(&payload.password)?,
        email,
        role: Default::default(),
        last_login: 0,
        last_modified: now,
        created_on: now,
        deleted: false,
        invite: payload.invite.clone(),
    };

    let mut user = user_repo::register_user(&state.store, &payload.invite, user, now).await?;
    tracing::info!(user = %user.uuid, role = %user.role, invite = %user.invite, "User registered");

    user.sanitize();
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user_details(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let payload: UpdateUserDetailsPayload = super::parse_validated(&body)?;

    if payload.first_name().is_none()
        && payload.last_name().is_none()
        && payload.new_password.is_none()
        && payload.current_password.is_none()
    {
        return Err(Error::NoUpdate.into());
    }
    if payload.new_password.is_some() != payload.current_password.is_some() {
        return Err(Error::ParameterGroup("newPassword, currentPassword".into()).into());
    }

    let new_hash = payload
        .new_password
        .as_deref()
        .map(hash_password)
        .transpose()?;
    let now = unix_now();

    let apply = |user: &mut User| -> Result<(), AppError> {
        if let Some(current) = payload.current_password.as_deref() {
            if !verify_password(current, &user.password)? {
                return Err(Error::PasswordMismatch.into());
            }
        }
        if let Some(first_name) = payload.first_name() {
            user.first_name = first_name.to_string();
        }
        if let Some(last_name) = payload.last_name() {
            user.last_name = last_name.to_string();
        }
        if let Some(hash) = new_hash {
            user.password = hash;
        }
        user.last_modified = now;
        Ok(())
    };
    let mut user = user_repo::update_user(&state.store, &user_id, apply)
        .await?
        .ok_or(Error::KeyNotFound(user_id))?;

    user.sanitize();
    Ok(Json(user))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let payload: UpdateUserRolePayload = super::parse_payload(&body)?;
    let now = unix_now();

    let mut user = user_repo::update_user(&state.store, &user_id, |user| {
        user.role = payload.role;
        user.last_modified = now;
        Ok::<_, AppError>(())
    })
    .await?
    .ok_or(Error::KeyNotFound(user_id))?;
    tracing::info!(user = %user.uuid, role = %user.role, "User role changed");

    user.sanitize();
    Ok(Json(user))
}

/// Sets a new password by consuming one of the user's password resets.
pub async fn reset_user_password(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<Json<User>, AppError> {
    let payload: ResetUserPasswordPayload = super::parse_validated(&body)?;
    let password_hash = hash_password(&payload.password)?;

    let mut user = user_repo::reset_password(
        &state.store,
        &user_id,
        &payload.reset_id,
        password_hash,
        unix_now(),
    )
    .await?;
    tracing::info!(user = %user.uuid, reset = %payload.reset_id, "Password reset consumed");

    user.sanitize();
    Ok(Json(user))
}

/// Toggles the soft-delete flag. Deleted users cannot log in and are left
/// out of listings; the record stays in storage.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let payload: DeletePayload = super::parse_payload(&body)?;
    let now = unix_now();

    user_repo::update_user(&state.store, &user_id, |user| {
        user.deleted = payload.deleted;
        user.last_modified = now;
        Ok::<_, AppError>(())
    })
    .await?
    .ok_or(Error::KeyNotFound(user_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ListResponse<User>>, AppError> {
    let payload = super::parse_list_payload(&body)?;
    let window = PageWindow::new(state.page_limit(), payload.offset);
    let users = user_repo::list_users(&state.store, payload.term(), window).await?;
    Ok(Json(ListResponse::new(users, window)))
}
