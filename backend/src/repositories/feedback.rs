use crate::{
    db::{buckets, Store, StoreError},
    models::{feedback::Feedback, PageWindow},
};

use super::common::{get_record, list_records, put_record, update_record};

pub async fn get_feedback(store: &Store, feedback_id: &str) -> Result<Option<Feedback>, StoreError> {
    get_record(store, buckets::FEEDBACK, feedback_id).await
}

pub async fn put_feedback(store: &Store, feedback: &Feedback) -> Result<(), StoreError> {
    put_record(store, buckets::FEEDBACK, &feedback.uuid, feedback).await
}

pub async fn set_resolved(
    store: &Store,
    feedback_id: &str,
    resolved: bool,
    at: i64,
) -> Result<Option<Feedback>, StoreError> {
    update_record(store, buckets::FEEDBACK, feedback_id, |feedback: &mut Feedback| {
        feedback.resolved = resolved;
        feedback.last_modified = at;
        Ok::<_, StoreError>(())
    })
    .await
}

/// One page of feedback, optionally filtered by submitting user.
pub async fn list_feedback(
    store: &Store,
    term: Option<&str>,
    window: PageWindow,
) -> Result<Vec<Feedback>, StoreError> {
    let entries: Vec<Feedback> = list_records(store, buckets::FEEDBACK).await?;
    let matching = entries
        .into_iter()
        .filter(|feedback| term.map_or(true, |term| feedback.matches_term(term)))
        .take(window.target())
        .collect();
    Ok(window.slice(matching))
}
