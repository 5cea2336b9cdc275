use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod policy;

/// Identifier of a user owning a point balance
pub type UserId = i64;

/// Current point balance of a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: UserId,

    /// Current amount of points
    ///
    /// This never goes below zero nor above the configured ceiling.
    pub points: u64,

    /// Time of the last write to this balance
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Balance of a user that has never been charged
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            points: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Record of one accepted charge or use
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Identifier assigned by the store, increasing with every append
    pub entry_id: u64,
    pub user_id: UserId,
    /// Magnitude of the transaction
    ///
    /// This is always strictly positive. The direction is given by `kind`.
    pub amount: u64,
    pub kind: TransactionType,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Points added to the balance
    Charge,
    /// Points removed from the balance
    Use,
}
