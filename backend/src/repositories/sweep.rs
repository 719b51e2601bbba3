//! Snapshot, filter, apply: the collect-then-delete pass used by the expiry
//! jobs and by session checkpoint clearing.
//!
//! Matching keys are collected from a read snapshot first; deletion happens
//! afterwards in a separate write transaction, so the bucket is never
//! mutated while it is being iterated.

use serde::de::DeserializeOwned;

use super::common::decode_entry;
use crate::db::{Store, StoreError};

/// Keys of the records in `bucket` for which `predicate` holds.
pub async fn collect_keys<T, F>(
    store: &Store,
    bucket: &str,
    predicate: F,
) -> Result<Vec<Vec<u8>>, StoreError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let entries = store.scan(bucket).await?;
    Ok(entries
        .into_iter()
        .filter(|(key, value)| {
            decode_entry::<T>(bucket, key, value)
                .map(|record| predicate(&record))
                .unwrap_or(false)
        })
        .map(|(key, _)| key)
        .collect())
}

/// Deletes `keys` from `bucket` in one write transaction. No transaction is
/// opened for an empty key set.
pub async fn delete_keys(
    store: &Store,
    bucket: &str,
    keys: &[Vec<u8>],
) -> Result<usize, StoreError> {
    if keys.is_empty() {
        return Ok(0);
    }
    let mut txn = store.begin_write().await?;
    for key in keys {
        txn.delete(bucket, key).await?;
    }
    txn.commit().await?;
    Ok(keys.len())
}

/// Removes every record of `bucket` matching `predicate` and returns how many
/// were deleted.
pub async fn sweep_bucket<T, F>(store: &Store, bucket: &str, predicate: F) -> Result<usize, StoreError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let keys = collect_keys(store, bucket, predicate).await?;
    delete_keys(store, bucket, &keys).await
}
