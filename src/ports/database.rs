use chrono::{DateTime, Utc};

use crate::domain::{Balance, HistoryEntry, TransactionType, UserId};

/// Storage for balances and their history
///
/// Implementations only persist what they are given. All validation happens before the
/// store is called.
#[mockall::automock]
#[async_trait::async_trait]
pub trait LedgerStorePort {
    /// Current balance of a user, or an empty balance if none was ever written
    async fn select_balance(&self, user_id: UserId) -> Result<Balance, Error>;

    /// Replace the balance of a user
    async fn upsert_balance(&self, user_id: UserId, points: u64) -> Result<Balance, Error>;

    /// Append a new entry to the history of a user and return it with its assigned id
    async fn append_history(
        &self,
        user_id: UserId,
        amount: u64,
        kind: TransactionType,
        occurred_at: DateTime<Utc>,
    ) -> Result<HistoryEntry, Error>;

    /// Full history of a user, in insertion order
    async fn select_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, Error>;

    /// Remove an entry whose balance write did not go through
    ///
    /// This is only used to undo an append when the following balance write failed. Removing
    /// an entry that does not exist is not an error.
    async fn remove_history(&self, user_id: UserId, entry_id: u64) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store could not serve a read
    ///
    /// This could represent connectivity, configuration, or permission errors from a concrete
    /// adapter.
    #[error("store unavailable: {0:?}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync>),

    /// The store could not complete a write
    ///
    /// Adapters must only return this when the write was not applied.
    #[error("store write failed: {0:?}")]
    WriteFailed(Box<dyn std::error::Error + Send + Sync>),
}
