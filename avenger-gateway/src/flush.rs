use std::sync::Arc;
use std::time::Duration;

use avenger_ledger::LedgerStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{error, info, warn};

/// Spawn the periodic ledger flush.
///
/// The first flush happens one full `period` after start; every tick flushes
/// unconditionally. The runner exits once `shutdown` flips to `true`. A flush
/// that is already running completes first, so awaiting the returned handle
/// guarantees no flush is in flight.
pub fn start_flush_runner(
    ledger: Arc<LedgerStore>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let mut interval = interval_at(Instant::now() + period, period);

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Failures are logged by the store; the next tick retries naturally.
                    let _ = ledger.flush().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("flush runner stopped");
    });

    info!("flush runner started (interval_seconds={})", period.as_secs());
    handle
}

/// Stop the flush runner, wait for it, then write one final snapshot.
///
/// An in-flight periodic flush finishes before the final one starts. The
/// final flush is bounded by `limit`; returns whether it completed.
pub async fn shutdown_flush(
    ledger: &LedgerStore,
    stop: &watch::Sender<bool>,
    runner: JoinHandle<()>,
    limit: Duration,
) -> bool {
    let _ = stop.send(true);
    if let Err(e) = runner.await {
        warn!("Flush runner ended abnormally: {}", e);
    }

    match tokio::time::timeout(limit, ledger.flush()).await {
        Ok(Ok(())) => {
            info!("Points saved on shutdown ({} entries)", ledger.len().await);
            true
        }
        // The store has already logged the cause
        Ok(Err(_)) => false,
        Err(_) => {
            error!("Final save timed out after {}ms", limit.as_millis());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avenger_ledger::UserId;

    #[tokio::test]
    async fn flushes_on_each_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let ledger = Arc::new(LedgerStore::open(&path));
        ledger.add(&UserId::from("U1"), 3).await;

        let (tx, rx) = watch::channel(false);
        let handle = start_flush_runner(Arc::clone(&ledger), Duration::from_millis(200), rx);

        // Nothing is written before the first full period
        assert!(ledger.last_flushed_at().await.is_none());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while ledger.last_flushed_at().await.is_none() && std::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(ledger.last_flushed_at().await.is_some());
        assert_eq!(LedgerStore::load(&path).balance(&UserId::from("U1")), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stops_on_shutdown_without_flushing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let ledger = Arc::new(LedgerStore::open(&path));

        let (tx, rx) = watch::channel(false);
        let handle = start_flush_runner(Arc::clone(&ledger), Duration::from_secs(300), rx);

        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn stops_when_sender_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(LedgerStore::open(dir.path().join("points.json")));
        let (tx, rx) = watch::channel(false);
        let handle = start_flush_runner(ledger, Duration::from_secs(300), rx);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_flush_persists_pending_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let ledger = Arc::new(LedgerStore::open(&path));

        let (tx, rx) = watch::channel(false);
        let handle = start_flush_runner(Arc::clone(&ledger), Duration::from_secs(300), rx);
        ledger.add(&UserId::from("U1"), 12).await;
        ledger.remove(&UserId::from("U2"), 4).await;

        let saved = shutdown_flush(&ledger, &tx, handle, Duration::from_secs(5)).await;

        assert!(saved);
        let on_disk = LedgerStore::load(&path);
        assert_eq!(on_disk.balance(&UserId::from("U1")), 12);
        assert_eq!(on_disk.len(), 2);
    }

    #[tokio::test]
    async fn shutdown_flush_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // The snapshot path is a directory, so the write fails
        let ledger = Arc::new(LedgerStore::with_ledger(dir.path(), Default::default()));
        let (tx, rx) = watch::channel(false);
        let handle = start_flush_runner(Arc::clone(&ledger), Duration::from_secs(300), rx);

        assert!(!shutdown_flush(&ledger, &tx, handle, Duration::from_secs(5)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_flush_gives_up_after_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        let ledger = Arc::new(LedgerStore::open(&path));
        ledger.add(&UserId::from("U1"), 1).await;

        let (tx, rx) = watch::channel(false);
        let handle = start_flush_runner(Arc::clone(&ledger), Duration::from_secs(300), rx);

        // Hold the ledger lock on another worker so the final flush stalls
        let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
        let holder = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger
                    .read(|_| {
                        let _ = locked_tx.send(());
                        std::thread::sleep(Duration::from_millis(500));
                    })
                    .await;
            })
        };
        locked_rx.await.unwrap();

        let saved = shutdown_flush(&ledger, &tx, handle, Duration::from_millis(50)).await;

        assert!(!saved);
        holder.await.unwrap();
        assert!(!path.exists());
    }
}
