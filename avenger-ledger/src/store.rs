//! Ledger store: owns the in-memory ledger and all snapshot I/O.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{PointsLedger, UserId};

/// Single source of truth for point balances.
///
/// Every mutation, flush and ranking read goes through the inner lock, so
/// the store can be shared between command handlers and the flush runner.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    ledger: Mutex<PointsLedger>,
    /// Serializes flushes so snapshots reach the file in the order taken.
    flush_lock: Mutex<()>,
    last_flushed_at: Mutex<Option<DateTime<Utc>>>,
}

impl LedgerStore {
    /// Load the snapshot at `path` and take ownership of it.
    ///
    /// Never fails: a missing or unreadable snapshot yields an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ledger = Self::load(&path);
        Self::with_ledger(path, ledger)
    }

    /// Wrap an existing ledger without touching the filesystem.
    pub fn with_ledger(path: impl Into<PathBuf>, ledger: PointsLedger) -> Self {
        Self {
            path: path.into(),
            ledger: Mutex::new(ledger),
            flush_lock: Mutex::new(()),
            last_flushed_at: Mutex::new(None),
        }
    }

    /// Read the persisted snapshot.
    ///
    /// A missing file is the expected first-run state and is logged at info.
    /// An unreadable or corrupt file is logged as an error and left in place
    /// for manual recovery; the returned ledger is empty.
    pub fn load(path: &Path) -> PointsLedger {
        match Self::try_load(path) {
            Ok(Some(ledger)) => {
                info!(
                    "Points loaded from {} ({} entries)",
                    path.display(),
                    ledger.len()
                );
                ledger
            }
            Ok(None) => {
                info!("No points file at {}, starting fresh", path.display());
                PointsLedger::new()
            }
            Err(e) => {
                error!("Error loading points from {}: {}", path.display(), e);
                PointsLedger::new()
            }
        }
    }

    /// Read the persisted snapshot, reporting failures.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn try_load(path: &Path) -> LedgerResult<Option<PointsLedger>> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LedgerError::Io(e)),
        };
        let ledger = serde_json::from_slice(&content)?;
        Ok(Some(ledger))
    }

    /// Add points without flooring; returns the new balance.
    pub async fn add(&self, user_id: &UserId, amount: i64) -> i64 {
        self.ledger.lock().await.add(user_id, amount)
    }

    /// Remove points, flooring at zero; returns the new balance.
    pub async fn remove(&self, user_id: &UserId, amount: i64) -> i64 {
        self.ledger.lock().await.remove(user_id, amount)
    }

    pub async fn balance(&self, user_id: &UserId) -> i64 {
        self.ledger.lock().await.balance(user_id)
    }

    pub async fn len(&self) -> usize {
        self.ledger.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ledger.lock().await.is_empty()
    }

    /// Run a read-only computation against the current ledger.
    pub async fn read<R>(&self, f: impl FnOnce(&PointsLedger) -> R) -> R {
        let ledger = self.ledger.lock().await;
        f(&ledger)
    }

    /// Clone of the current ledger.
    pub async fn snapshot(&self) -> PointsLedger {
        self.ledger.lock().await.clone()
    }

    /// Time of the last successful flush, if any.
    pub async fn last_flushed_at(&self) -> Option<DateTime<Utc>> {
        *self.last_flushed_at.lock().await
    }

    /// Write the whole ledger to the snapshot file.
    ///
    /// The write is not atomic: a crash mid-write can leave a truncated file.
    /// Failures are logged here and returned for the caller to inspect; they
    /// are never retried.
    pub async fn flush(&self) -> LedgerResult<()> {
        let _guard = self.flush_lock.lock().await;

        let snapshot = self.snapshot().await;
        match self.write_snapshot(&snapshot).await {
            Ok(()) => {
                *self.last_flushed_at.lock().await = Some(Utc::now());
                debug!(
                    "Points saved to {} ({} entries)",
                    self.path.display(),
                    snapshot.len()
                );
                Ok(())
            }
            Err(e) => {
                error!("Error saving points to {}: {}", self.path.display(), e);
                Err(e)
            }
        }
    }

    async fn write_snapshot(&self, snapshot: &PointsLedger) -> LedgerResult<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(id: &str) -> UserId {
        UserId::from(id)
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");

        assert!(LedgerStore::try_load(&path).unwrap().is_none());
        assert!(LedgerStore::load(&path).is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        std::fs::write(&path, b"{\"123\": 4").unwrap();

        assert!(matches!(
            LedgerStore::try_load(&path),
            Err(LedgerError::Json(_))
        ));
        assert!(LedgerStore::load(&path).is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"123\": 4");
    }

    #[test]
    fn load_directory_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            LedgerStore::try_load(dir.path()),
            Err(LedgerError::Io(_))
        ));
        assert!(LedgerStore::load(dir.path()).is_empty());
    }

    #[test]
    fn load_accepts_source_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        std::fs::write(
            &path,
            r#"{"123456789012345678": 42, "987654321098765432": 0}"#,
        )
        .unwrap();

        let ledger = LedgerStore::load(&path);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.balance(&uid("123456789012345678")), 42);
        assert_eq!(ledger.balance(&uid("987654321098765432")), 0);
    }

    #[tokio::test]
    async fn add_and_remove_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path().join("points.json"));

        assert_eq!(store.add(&uid("U1"), 20).await, 20);
        assert_eq!(store.add(&uid("U1"), 30).await, 50);
        assert_eq!(store.remove(&uid("U1"), 80).await, 0);
        assert_eq!(store.balance(&uid("U1")).await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn flush_writes_pretty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let store = LedgerStore::open(&path);
        store.add(&uid("123456789012345678"), 42).await;
        store.add(&uid("987654321098765432"), 0).await;

        store.flush().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        insta::assert_snapshot!(written, @r#"
        {
          "123456789012345678": 42,
          "987654321098765432": 0
        }
        "#);
    }

    #[tokio::test]
    async fn flush_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("points.json");
        let store = LedgerStore::open(&path);
        store.add(&uid("U1"), 1).await;

        store.flush().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn flush_records_timestamp_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::open(dir.path().join("points.json"));
        assert!(store.last_flushed_at().await.is_none());

        store.flush().await.unwrap();
        assert!(store.last_flushed_at().await.is_some());

        // A directory at the target path makes the write fail
        let blocked = LedgerStore::with_ledger(dir.path(), PointsLedger::new());
        assert!(blocked.flush().await.is_err());
        assert!(blocked.last_flushed_at().await.is_none());
    }

    #[tokio::test]
    async fn flush_overwrites_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = LedgerStore::open(&path);
        assert!(store.is_empty().await);
        store.add(&uid("U1"), 3).await;
        store.flush().await.unwrap();

        let reloaded = LedgerStore::load(&path);
        assert_eq!(reloaded.balance(&uid("U1")), 3);
    }

    #[tokio::test]
    async fn read_sees_current_state() {
        let store = LedgerStore::with_ledger("unused.json", PointsLedger::new());
        store.add(&uid("A"), 5).await;

        let total: i64 = store.read(|l| l.iter().map(|(_, b)| b).sum()).await;
        assert_eq!(total, 5);
    }
}
