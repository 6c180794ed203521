use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use avenger_core::Settings;
use avenger_ledger::LedgerStore;

/// Shared application state
///
/// Handed as `Arc<AppState>` to the Discord event handler and the keep-alive
/// server. The ledger store is shared separately with the flush runner.
pub struct AppState {
    /// Points ledger (single owner of snapshot I/O)
    pub ledger: Arc<LedgerStore>,
    /// Non-secret settings
    pub settings: Settings,
    /// Reused HTTP client for avatar downloads
    pub http_client: reqwest::Client,
    started_at: Instant,
    reconnects: AtomicU64,
}

impl AppState {
    pub fn new(ledger: Arc<LedgerStore>, settings: Settings) -> Self {
        Self {
            ledger,
            settings,
            http_client: reqwest::Client::new(),
            started_at: Instant::now(),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Time since the process started.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Count a gateway reconnect; returns the running total.
    pub fn record_reconnect(&self) -> u64 {
        self.reconnects.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    pub fn command_prefix(&self) -> &str {
        &self.settings.bot.command_prefix
    }
}

/// Render a duration as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60,
    );
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
