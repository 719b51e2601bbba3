pub mod connection;
pub mod store;

pub use connection::{create_pool, DbPool, StorageLock, OPEN_TIMEOUT};
pub use store::{buckets, bucket_path, Store, StoreError, WriteTxn};

/// Takes exclusive ownership of the storage file, opens it and prepares
/// every bucket. Fails when another owner keeps the file past
/// [`OPEN_TIMEOUT`].
pub async fn open_store(storage_path: &std::path::Path) -> anyhow::Result<Store> {
    let file_lock = StorageLock::acquire(storage_path).await?;
    let pool = create_pool(storage_path).await?;
    let store = Store::new(pool, file_lock);
    store.initialize().await?;
    Ok(store)
}
