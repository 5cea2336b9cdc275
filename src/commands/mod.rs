use std::{future::Future, sync::Arc};

use chrono::Utc;
use tower::ServiceExt;
use tracing::{error, warn};

use crate::{
    config::LedgerConfig,
    domain::{policy::AmountPolicy, Balance, HistoryEntry, TransactionType, UserId},
    ports::database::LedgerStorePort,
};

pub mod balance;
pub mod charge;
pub mod history;
pub mod locks;
pub mod use_points;

use self::{
    balance::GetBalanceRequest, charge::ChargeRequest, history::GetHistoryRequest,
    locks::UserLocks, use_points::UsePointsRequest,
};

/// Point ledger operations on top of a [`LedgerStorePort`]
///
/// Every operation is available both as a [`tower::Service`] implementation and as a plain
/// async method. Operations on the same user are serialized; operations on different users
/// run in parallel.
pub struct DomainLogic<D> {
    database: Arc<D>,
    policy: AmountPolicy,
    locks: UserLocks,
}

impl<D> DomainLogic<D> {
    pub fn new(database: Arc<D>, config: &LedgerConfig) -> Self {
        Self {
            database,
            policy: AmountPolicy::new(config.max_balance),
            locks: UserLocks::default(),
        }
    }

}

impl<D> Clone for DomainLogic<D> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            policy: self.policy,
            locks: self.locks.clone(),
        }
    }
}

impl<D> DomainLogic<D>
where
    D: LedgerStorePort + Send + Sync + 'static,
{
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, Error> {
        self.clone().oneshot(GetBalanceRequest { user_id }).await
    }

    pub async fn get_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, Error> {
        self.clone().oneshot(GetHistoryRequest { user_id }).await
    }

    pub async fn charge(&self, user_id: UserId, amount: i64) -> Result<Balance, Error> {
        self.clone().oneshot(ChargeRequest { user_id, amount }).await
    }

    pub async fn use_points(&self, user_id: UserId, amount: i64) -> Result<Balance, Error> {
        self.clone()
            .oneshot(UsePointsRequest { user_id, amount })
            .await
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("requested amount must be at least 1, got {requested}")]
    InvalidAmount { requested: i64 },

    #[error("balance cannot exceed {ceiling}: {current} + {requested}")]
    BalanceCeilingExceeded {
        current: u64,
        requested: i64,
        ceiling: u64,
    },

    #[error("insufficient balance: {requested} requested, {current} available")]
    InsufficientBalance { current: u64, requested: i64 },

    #[error("database port error: {0:?}")]
    Store(#[from] crate::ports::database::Error),

    /// The balance write failed and the history entry recorded before it could not be removed
    ///
    /// The history of the user contains an entry that has no matching balance change.
    #[error("history entry {entry_id} of user {user_id} left without a balance change: {source:?}")]
    PartiallyApplied {
        user_id: UserId,
        entry_id: u64,
        source: crate::ports::database::Error,
    },

    /// The runtime shut down before a started write could finish
    ///
    /// Whether the write went through is unknown.
    #[error("operation aborted: {0:?}")]
    Aborted(#[source] tokio::task::JoinError),
}

impl Error {
    /// Stable identifier for this kind of error
    pub fn code(&self) -> &'static str {
        use crate::ports::database::Error as StoreError;

        match self {
            Error::InvalidAmount { .. } => "E001",
            Error::BalanceCeilingExceeded { .. } => "E002",
            Error::InsufficientBalance { .. } => "E003",
            Error::Store(StoreError::Unavailable(_)) => "E101",
            Error::Store(StoreError::WriteFailed(_)) => "E102",
            Error::PartiallyApplied { .. } => "E103",
            Error::Aborted(_) => "E104",
        }
    }
}

/// Run a locked read-validate-write section on its own task
///
/// Once started, the section finishes even if the caller stops waiting for it, so that a
/// cancelled request never leaves a history entry without its balance write.
async fn run_detached<F>(section: F) -> Result<Balance, Error>
where
    F: Future<Output = Result<Balance, Error>> + Send + 'static,
{
    match tokio::spawn(section).await {
        Ok(res) => res,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => Err(Error::Aborted(err)),
    }
}

/// Record an accepted transaction and write the new balance
///
/// The history entry is appended first and the balance write comes last. If the balance write
/// fails, the entry is removed again so that no entry outlives a failed operation.
///
/// Callers must hold the lock of `user_id`.
async fn commit<D>(
    database: &D,
    user_id: UserId,
    points: u64,
    amount: u64,
    kind: TransactionType,
) -> Result<Balance, Error>
where
    D: LedgerStorePort + ?Sized,
{
    let entry = database
        .append_history(user_id, amount, kind, Utc::now())
        .await?;

    match database.upsert_balance(user_id, points).await {
        Ok(balance) => Ok(balance),
        Err(err) => {
            warn!(
                user_id,
                entry_id = entry.entry_id,
                error = %err,
                "balance write failed, removing history entry"
            );
            if let Err(rollback_err) = database.remove_history(user_id, entry.entry_id).await {
                error!(
                    user_id,
                    entry_id = entry.entry_id,
                    error = %rollback_err,
                    "could not remove history entry after failed balance write"
                );
                return Err(Error::PartiallyApplied {
                    user_id,
                    entry_id: entry.entry_id,
                    source: rollback_err,
                });
            }
            Err(err.into())
        }
    }
}
