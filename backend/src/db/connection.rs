use fs2::FileExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    time::Duration,
};

pub type DbPool = SqlitePool;

/// Bounded wait for access to the storage file at process start.
pub const OPEN_TIMEOUT: Duration = Duration::from_secs(1);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);
const MAX_CONNECTIONS: u32 = 8;

/// Exclusive ownership of a storage file, held through a sibling `.lock`
/// file. Released when dropped.
#[derive(Debug)]
pub struct StorageLock {
    file: File,
    path: PathBuf,
}

impl StorageLock {
    /// Takes the lock for `storage_path`, retrying until [`OPEN_TIMEOUT`]
    /// elapses while another owner holds it.
    pub async fn acquire(storage_path: &Path) -> anyhow::Result<Self> {
        let path = lock_path(storage_path);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let wait = async {
            loop {
                match file.try_lock_exclusive() {
                    Ok(()) => return Ok(()),
                    Err(err) if is_contended(&err) => {
                        tokio::time::sleep(LOCK_RETRY_INTERVAL).await
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        tokio::time::timeout(OPEN_TIMEOUT, wait)
            .await
            .map_err(|_| {
                tracing::error!(path = %path.display(), "Storage is locked by another owner");
                anyhow::anyhow!(
                    "timed out waiting for exclusive access to {} after {:?}",
                    storage_path.display(),
                    OPEN_TIMEOUT
                )
            })??;

        tracing::debug!(path = %path.display(), "Acquired storage lock");
        Ok(Self { file, path })
    }
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to release storage lock");
        }
    }
}

fn lock_path(storage_path: &Path) -> PathBuf {
    let mut name = OsString::from(storage_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

pub async fn create_pool(storage_path: &Path) -> anyhow::Result<DbPool> {
    let options = SqliteConnectOptions::new()
        .filename(storage_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(OPEN_TIMEOUT);

    let connect = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options);

    let pool = tokio::time::timeout(OPEN_TIMEOUT, connect)
        .await
        .map_err(|_| {
            anyhow::anyhow!(
                "timed out opening storage at {} after {:?}",
                storage_path.display(),
                OPEN_TIMEOUT
            )
        })??;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_file_sits_next_to_storage() {
        assert_eq!(
            lock_path(Path::new("/var/lib/adminkit.db")),
            PathBuf::from("/var/lib/adminkit.db.lock")
        );
    }
}
