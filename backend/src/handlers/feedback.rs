use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, Error},
    models::{
        feedback::{CreateFeedbackPayload, Feedback, UpdateFeedbackPayload},
        session::Session,
        ListResponse, PageWindow,
    },
    repositories::feedback as feedback_repo,
    state::AppState,
    utils::{time::unix_now, token::generate_record_id},
};

pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let payload: CreateFeedbackPayload = super::parse_validated(&body)?;

    let now = unix_now();
    let feedback = Feedback {
        uuid: generate_record_id(),
        details: payload.details,
        user: session.user,
        resolved: false,
        created_on: now,
        last_modified: now,
    };
    feedback_repo::put_feedback(&state.store, &feedback).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(feedback_id): Path<String>,
) -> Result<Json<Feedback>, AppError> {
    let feedback = feedback_repo::get_feedback(&state.store, &feedback_id)
        .await?
        .ok_or(Error::KeyNotFound(feedback_id))?;
    Ok(Json(feedback))
}

/// Marks feedback resolved or reopens it.
pub async fn update_feedback_status(
    State(state): State<AppState>,
    Path(feedback_id): Path<String>,
    body: Bytes,
) -> Result<Json<Feedback>, AppError> {
    let payload: UpdateFeedbackPayload = super::parse_payload(&body)?;
    let feedback = feedback_repo::set_resolved(&state.store, &feedback_id, payload.resolved, unix_now())
        .await?
        .ok_or(Error::KeyNotFound(feedback_id))?;
    Ok(Json(feedback))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ListResponse<Feedback>>, AppError> {
    let payload = super::parse_list_payload(&body)?;
    let window = PageWindow::new(state.page_limit(), payload.offset);
    let entries = feedback_repo::list_feedback(&state.store, payload.term(), window).await?;
    Ok(Json(ListResponse::new(entries, window)))
}
