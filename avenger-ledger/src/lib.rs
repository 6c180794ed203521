//! avenger-ledger: points ledger persistence and ranking for Event Avenger.
//!
//! This crate provides:
//! - The in-memory points ledger and its whole-file JSON snapshot
//! - Load-on-start, flush and shutdown-flush through [`LedgerStore`]
//! - Pure leaderboard and rank computation over a ledger snapshot

pub mod error;
pub mod ledger;
pub mod ranking;
pub mod store;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{PointsLedger, UserId};
pub use ranking::{
    DisplayNameResolver, LeaderboardEntry, RankEntry, RankSummary, rank_of, resolve_top_n,
    standings, top_n,
};
pub use store::LedgerStore;
