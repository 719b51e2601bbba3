//! Audit trail storage.
//!
//! Records are partitioned as `log/<DD-Mon-YYYY>/<requestor token>`. The
//! serialized record itself is the key and the value is empty, so a bucket
//! iterates in record-byte order and identical records collapse into one.

use crate::{
    db::{bucket_path, buckets, Store, StoreError},
    models::{audit_log::RequestLog, PageWindow},
};

/// Appends `record` under the given day, creating the day and requestor
/// buckets on first use.
pub async fn append_request_log(
    store: &Store,
    day: &str,
    record: &RequestLog,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(record)?;
    let mut txn = store.begin_write().await?;
    let bucket = txn
        .create_bucket_if_not_exists(&[buckets::LOG, day, &record.requestor])
        .await?;
    txn.put(&bucket, &bytes, &[]).await?;
    txn.commit().await
}

#[derive(Debug, Clone, Default)]
pub struct RequestLogFilters<'a> {
    pub requestor: Option<&'a str>,
    pub request_type: Option<&'a str>,
}

/// One page of a day's records. Requestors are visited in token order and
/// records within a requestor in key order. A day with no records yields an
/// empty page.
pub async fn list_request_logs(
    store: &Store,
    day: &str,
    filters: RequestLogFilters<'_>,
    window: PageWindow,
) -> Result<Vec<RequestLog>, StoreError> {
    let day_bucket = bucket_path(&[buckets::LOG, day])?;
    if !store.bucket_exists(&day_bucket).await? {
        return Ok(Vec::new());
    }

    let requestors = match filters.requestor {
        Some(requestor) => vec![requestor.to_string()],
        None => store.child_buckets(&day_bucket).await?,
    };

    let mut collected = Vec::new();
    'requestors: for requestor in requestors {
        let bucket = match bucket_path(&[buckets::LOG, day, &requestor]) {
            Ok(bucket) => bucket,
            Err(_) => continue,
        };
        if !store.bucket_exists(&bucket).await? {
            continue;
        }
        for (key, _) in store.scan(&bucket).await? {
            let record: RequestLog = match serde_json::from_slice(&key) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(bucket = %bucket, error = %err, "Skipping malformed audit record");
                    continue;
                }
            };
            let type_matches = filters
                .request_type
                .map_or(true, |wanted| record.request_type.eq_ignore_ascii_case(wanted));
            if type_matches {
                collected.push(record);
                if collected.len() >= window.target() {
                    break 'requestors;
                }
            }
        }
    }

    Ok(window.slice(collected))
}
