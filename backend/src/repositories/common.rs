//! Shared repository utilities: JSON records keyed by their identifier.

use serde::{de::DeserializeOwned, Serialize};

use crate::db::{Store, StoreError, WriteTxn};

pub async fn get_record<T: DeserializeOwned>(
    store: &Store,
    bucket: &str,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(bucket, id.as_bytes()).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Inserts or replaces the record stored under `id`.
pub async fn put_record<T: Serialize>(
    store: &Store,
    bucket: &str,
    id: &str,
    record: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(record)?;
    let mut txn = store.begin_write().await?;
    txn.put(bucket, id.as_bytes(), &bytes).await?;
    txn.commit().await
}

pub async fn get_record_in<T: DeserializeOwned>(
    txn: &mut WriteTxn<'_>,
    bucket: &str,
    id: &str,
) -> Result<Option<T>, StoreError> {
    match txn.get(bucket, id.as_bytes()).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub async fn put_record_in<T: Serialize>(
    txn: &mut WriteTxn<'_>,
    bucket: &str,
    id: &str,
    record: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(record)?;
    txn.put(bucket, id.as_bytes(), &bytes).await
}

/// Reads the record under `id`, applies `apply` and writes it back, all in
/// one write transaction. A missing record yields `None` and nothing is
/// written; an error from `apply` rolls back.
pub async fn update_record<T, E, F>(
    store: &Store,
    bucket: &str,
    id: &str,
    apply: F,
) -> Result<Option<T>, E>
where
    T: Serialize + DeserializeOwned,
    E: From<StoreError>,
    F: FnOnce(&mut T) -> Result<(), E>,
{
    let mut txn = store.begin_write().await?;
    let Some(mut record) = get_record_in::<T>(&mut txn, bucket, id).await? else {
        return Ok(None);
    };
    apply(&mut record)?;
    put_record_in(&mut txn, bucket, id, &record).await?;
    txn.commit().await?;
    Ok(Some(record))
}

/// Decodes every record of a bucket in key order. Entries that do not decode
/// are skipped.
pub async fn list_records<T: DeserializeOwned>(
    store: &Store,
    bucket: &str,
) -> Result<Vec<T>, StoreError> {
    let entries = store.scan(bucket).await?;
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| decode_entry(bucket, &key, &value))
        .collect())
}

pub(crate) fn decode_entry<T: DeserializeOwned>(bucket: &str, key: &[u8], value: &[u8]) -> Option<T> {
    match serde_json::from_slice(value) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(
                bucket,
                key = %String::from_utf8_lossy(key),
                error = %err,
                "Skipping malformed record"
            );
            None
        }
    }
}
