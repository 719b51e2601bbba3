//! Durable checkpoint of the session cache.

use crate::{
    db::{buckets, Store, StoreError},
    models::session::Session,
};

use super::{common::list_records, sweep::delete_keys};

/// Every session stored by the last checkpoint, expired or not.
pub async fn load_checkpoint(store: &Store) -> Result<Vec<Session>, StoreError> {
    list_records(store, buckets::SESSION).await
}

/// Writes `sessions` to the checkpoint in a single write transaction.
pub async fn save_checkpoint(store: &Store, sessions: &[Session]) -> Result<usize, StoreError> {
    let mut txn = store.begin_write().await?;
    for session in sessions {
        let bytes = serde_json::to_vec(session)?;
        txn.put(buckets::SESSION, session.token.as_bytes(), &bytes)
            .await?;
    }
    txn.commit().await?;
    Ok(sessions.len())
}

/// Empties the checkpoint: keys are collected from a snapshot, then deleted
/// in a separate write transaction.
pub async fn clear_checkpoint(store: &Store) -> Result<usize, StoreError> {
    let keys: Vec<Vec<u8>> = store
        .scan(buckets::SESSION)
        .await?
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    delete_keys(store, buckets::SESSION, &keys).await
}
