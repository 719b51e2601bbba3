use crate::{
    db::{buckets, Store, StoreError},
    models::password_reset::PassReset,
};

use super::common::{get_record, put_record, update_record};

pub async fn get_reset(store: &Store, reset_id: &str) -> Result<Option<PassReset>, StoreError> {
    get_record(store, buckets::PASS_RESET, reset_id).await
}

pub async fn put_reset(store: &Store, reset: &PassReset) -> Result<(), StoreError> {
    put_record(store, buckets::PASS_RESET, &reset.uuid, reset).await
}

/// `None` when the reset no longer exists, including when a sweep removed it
/// first; a swept reset is never written back.
pub async fn mark_reset_used(
    store: &Store,
    reset_id: &str,
    at: i64,
) -> Result<Option<PassReset>, StoreError> {
    update_record(store, buckets::PASS_RESET, reset_id, |reset: &mut PassReset| {
        reset.used = true;
        reset.last_modified = at;
        Ok::<_, StoreError>(())
    })
    .await
}
