use axum::{body::Bytes, extract::State, Json};

use crate::{
    error::{AppError, Error},
    models::{
        audit_log::{ListRequestLogPayload, RequestLog},
        ListResponse, PageWindow,
    },
    repositories::audit_log::RequestLogFilters,
    state::AppState,
    utils::time::parse_log_date,
};

/// Lists one page of a day's audit trail.
pub async fn list_logs(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ListResponse<RequestLog>>, AppError> {
    let payload: ListRequestLogPayload = super::parse_payload(&body)?;
    let date =
        parse_log_date(&payload.date).ok_or_else(|| Error::InvalidParameter("date".into()))?;

    let window = PageWindow::new(state.page_limit(), payload.offset);
    let filters = RequestLogFilters {
        requestor: payload.requestor.as_deref().filter(|value| !value.is_empty()),
        request_type: payload
            .request_type
            .as_deref()
            .filter(|value| !value.is_empty()),
    };
    let records = state.audit.list(date, filters, window).await?;
    Ok(Json(ListResponse::new(records, window)))
}
