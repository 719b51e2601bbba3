//! Bucketed key/value store on top of SQLite.
//!
//! Buckets are named partitions that may nest (`log/18-Oct-2026/<token>`).
//! Entries within a bucket iterate in key-byte order. Reads may run
//! concurrently from any task; every write transaction holds the store-wide
//! write lock for its whole lifetime, so writers across all buckets are
//! serialized through a single point.

use std::sync::Arc;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use super::connection::{DbPool, StorageLock};

/// Top-level bucket names.
pub mod buckets {
    pub const SESSION: &str = "session";
    pub const USER: &str = "user";
    pub const INVITE: &str = "invite";
    pub const PASS_RESET: &str = "passreset";
    pub const FEEDBACK: &str = "feedback";
    pub const CACHE: &str = "cache";
    pub const LOG: &str = "log";

    pub const ALL: [&str; 7] = [SESSION, USER, INVITE, PASS_RESET, FEEDBACK, CACHE, LOG];
}

pub const BUCKET_SEPARATOR: char = '/';

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("malformed record: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("bucket '{0}' not found")]
    BucketNotFound(String),
    #[error("invalid bucket name '{0}'")]
    InvalidBucketName(String),
}

/// Joins bucket name segments into a nested bucket path.
pub fn bucket_path(segments: &[&str]) -> Result<String, StoreError> {
    let joined = segments.join("/");
    if segments.is_empty()
        || segments
            .iter()
            .any(|segment| segment.is_empty() || segment.contains(BUCKET_SEPARATOR))
    {
        return Err(StoreError::InvalidBucketName(joined));
    }
    Ok(joined)
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: DbPool,
    write_lock: Arc<Mutex<()>>,
    _file_lock: Arc<StorageLock>,
}

impl Store {
    /// The storage file stays locked for as long as any clone is alive.
    pub fn new(pool: DbPool, file_lock: StorageLock) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
            _file_lock: Arc::new(file_lock),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Applies the schema and creates every top-level bucket.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        {
            let _guard = self.write_lock.lock().await;
            sqlx::migrate!("./migrations").run(&self.pool).await?;
        }

        let mut txn = self.begin_write().await?;
        for name in buckets::ALL {
            txn.create_bucket_if_not_exists(&[name]).await?;
        }
        txn.commit().await
    }

    /// Opens a write transaction. The store-wide write lock is held until
    /// the transaction is committed or dropped (dropping rolls back).
    pub async fn begin_write(&self) -> Result<WriteTxn<'_>, StoreError> {
        let guard = self.write_lock.lock().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTxn { tx, _guard: guard })
    }

    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        bucket_exists(&mut conn, bucket).await
    }

    #[tracing::instrument(level = "debug", skip(self, key))]
    pub async fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_bucket(&mut tx, bucket).await?;
        let value = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM kv_entries WHERE bucket = ? AND key = ?",
        )
        .bind(bucket)
        .bind(key)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(value)
    }

    /// Reads every entry of a bucket in key order from a single snapshot.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn scan(&self, bucket: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_bucket(&mut tx, bucket).await?;
        let entries = sqlx::query_as::<_, (Vec<u8>, Vec<u8>)>(
            "SELECT key, value FROM kv_entries WHERE bucket = ? ORDER BY key",
        )
        .bind(bucket)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Names of the buckets nested directly under `parent`, in name order.
    pub async fn child_buckets(&self, parent: &str) -> Result<Vec<String>, StoreError> {
        let mut tx = self.pool.begin().await?;
        ensure_bucket(&mut tx, parent).await?;
        let paths = sqlx::query_scalar::<_, String>(
            "SELECT path FROM buckets WHERE parent = ? ORDER BY path",
        )
        .bind(parent)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let prefix_len = parent.len() + BUCKET_SEPARATOR.len_utf8();
        Ok(paths
            .into_iter()
            .filter_map(|path| path.get(prefix_len..).map(str::to_string))
            .collect())
    }
}

/// A write transaction holding the store-wide write lock.
pub struct WriteTxn<'a> {
    tx: Transaction<'static, Sqlite>,
    _guard: MutexGuard<'a, ()>,
}

impl WriteTxn<'_> {
    /// Creates the bucket at `segments` and any missing ancestors.
    /// Returns the bucket's path.
    pub async fn create_bucket_if_not_exists(
        &mut self,
        segments: &[&str],
    ) -> Result<String, StoreError> {
        let path = bucket_path(segments)?;
        let mut parent: Option<String> = None;
        for depth in 1..=segments.len() {
            let current = segments[..depth].join("/");
            sqlx::query("INSERT INTO buckets (path, parent) VALUES (?, ?) ON CONFLICT(path) DO NOTHING")
                .bind(&current)
                .bind(parent.as_deref())
                .execute(&mut *self.tx)
                .await?;
            parent = Some(current);
        }
        Ok(path)
    }

    /// Reads through this transaction, so the value cannot change before
    /// commit.
    pub async fn get(&mut self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        ensure_bucket(&mut self.tx, bucket).await?;
        let value = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM kv_entries WHERE bucket = ? AND key = ?",
        )
        .bind(bucket)
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(value)
    }

    pub async fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        ensure_bucket(&mut self.tx, bucket).await?;
        sqlx::query(
            "INSERT INTO kv_entries (bucket, key, value) VALUES (?, ?, ?) \
             ON CONFLICT(bucket, key) DO UPDATE SET value = excluded.value",
        )
        .bind(bucket)
        .bind(key)
        .bind(value)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    /// Deleting a key that does not exist is not an error.
    pub async fn delete(&mut self, bucket: &str, key: &[u8]) -> Result<(), StoreError> {
        ensure_bucket(&mut self.tx, bucket).await?;
        sqlx::query("DELETE FROM kv_entries WHERE bucket = ? AND key = ?")
            .bind(bucket)
            .bind(key)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

async fn bucket_exists(conn: &mut SqliteConnection, bucket: &str) -> Result<bool, StoreError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM buckets WHERE path = ?")
        .bind(bucket)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found > 0)
}

async fn ensure_bucket(conn: &mut SqliteConnection, bucket: &str) -> Result<(), StoreError> {
    if bucket_exists(conn, bucket).await? {
        Ok(())
    } else {
        Err(StoreError::BucketNotFound(bucket.to_string()))
    }
}
