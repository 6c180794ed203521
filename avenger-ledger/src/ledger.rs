//! In-memory points ledger.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque chat-platform user identifier.
///
/// Stored as the decimal string the snapshot uses for its keys. Ordering is
/// plain string ordering, which is the ranking tiebreak.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form, when the id is a platform snowflake.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Mapping from user to point balance.
///
/// A user absent from the map has a balance of zero. The map serializes as a
/// flat JSON object, e.g. `{"123456789012345678": 42}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointsLedger {
    balances: BTreeMap<UserId, i64>,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, zero for unknown users.
    pub fn balance(&self, user_id: &UserId) -> i64 {
        self.balances.get(user_id).copied().unwrap_or(0)
    }

    /// Add `amount` to the user's balance without flooring at zero.
    ///
    /// Returns the new balance.
    pub fn add(&mut self, user_id: &UserId, amount: i64) -> i64 {
        let next = self.balance(user_id).saturating_add(amount);
        self.balances.insert(user_id.clone(), next);
        next
    }

    /// Subtract `amount` from the user's balance, flooring at zero.
    ///
    /// Returns the new balance.
    pub fn remove(&mut self, user_id: &UserId, amount: i64) -> i64 {
        let next = self.balance(user_id).saturating_sub(amount).max(0);
        self.balances.insert(user_id.clone(), next);
        next
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Entries in ascending user id order.
    pub fn iter(&self) -> impl Iterator<Item = (&UserId, i64)> {
        self.balances.iter().map(|(id, balance)| (id, *balance))
    }
}

impl FromIterator<(UserId, i64)> for PointsLedger {
    fn from_iter<I: IntoIterator<Item = (UserId, i64)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}
