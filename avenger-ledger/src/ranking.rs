//! Leaderboard and rank computation over a ledger snapshot.
//!
//! Everything here is side-effect free. Ordering is balance descending with
//! ties broken by ascending user id, so output is reproducible.

use std::cmp::Ordering;

use async_trait::async_trait;
use futures::future::join_all;

use crate::ledger::{PointsLedger, UserId};

/// One ranked ledger entry. `position` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub user_id: UserId,
    pub balance: i64,
    pub position: usize,
}

/// A single user's standing, as rendered on a rank card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankSummary {
    pub balance: i64,
    pub position: usize,
    pub ledger_size: usize,
}

/// A leaderboard row after display-name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub balance: i64,
    pub position: usize,
}

/// Looks up the display name of a community member.
///
/// Returns `None` when the user is no longer a member.
#[async_trait]
pub trait DisplayNameResolver: Send + Sync {
    async fn display_name(&self, user_id: &UserId) -> Option<String>;
}

fn standing_order(a: (&UserId, i64), b: (&UserId, i64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Every ledger entry, ranked.
pub fn standings(ledger: &PointsLedger) -> Vec<RankEntry> {
    let mut entries: Vec<(&UserId, i64)> = ledger.iter().collect();
    entries.sort_by(|a, b| standing_order(*a, *b));
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, (user_id, balance))| RankEntry {
            user_id: user_id.clone(),
            balance,
            position: idx + 1,
        })
        .collect()
}

/// The first `n` ranked entries.
pub fn top_n(ledger: &PointsLedger, n: usize) -> Vec<RankEntry> {
    let mut ranked = standings(ledger);
    ranked.truncate(n);
    ranked
}

/// Balance and 1-based position of `user_id` across the whole ledger.
///
/// A user absent from the ledger has balance 0 and is placed after everyone
/// else, at `ledger_size + 1`.
pub fn rank_of(ledger: &PointsLedger, user_id: &UserId) -> RankSummary {
    let ledger_size = ledger.len();
    let position = standings(ledger)
        .into_iter()
        .find(|entry| &entry.user_id == user_id)
        .map(|entry| entry.position)
        .unwrap_or(ledger_size + 1);

    RankSummary {
        balance: ledger.balance(user_id),
        position,
        ledger_size,
    }
}

/// Top `n` entries with display names, dropping users the resolver no
/// longer knows. Positions keep their ranked value, so a dropped user leaves
/// a gap.
pub async fn resolve_top_n(
    ledger: &PointsLedger,
    n: usize,
    resolver: &dyn DisplayNameResolver,
) -> Vec<LeaderboardEntry> {
    let ranked = top_n(ledger, n);
    let names = join_all(
        ranked
            .iter()
            .map(|entry| resolver.display_name(&entry.user_id)),
    )
    .await;

    ranked
        .into_iter()
        .zip(names)
        .filter_map(|(entry, name)| {
            name.map(|display_name| LeaderboardEntry {
                display_name,
                balance: entry.balance,
                position: entry.position,
            })
        })
        .collect()
}
