//! Small named values kept in the `cache` bucket.

use crate::db::{buckets, Store, StoreError};

/// Key under which the bootstrap admin's user id is stored.
pub const ADMIN_KEY: &str = "admin";

pub async fn get_admin_id(store: &Store) -> Result<Option<String>, StoreError> {
    Ok(store
        .get(buckets::CACHE, ADMIN_KEY.as_bytes())
        .await?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

pub async fn set_admin_id(store: &Store, user_id: &str) -> Result<(), StoreError> {
    let mut txn = store.begin_write().await?;
    txn.put(buckets::CACHE, ADMIN_KEY.as_bytes(), user_id.as_bytes())
        .await?;
    txn.commit().await
}
