use crate::{
    domain::{Balance, HistoryEntry, TransactionType, UserId},
    ports::database::{Error, LedgerStorePort},
};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Clone, Debug, Default)]
pub struct MemoryLedgerStore {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    balances: HashMap<UserId, Balance>,
    histories: HashMap<UserId, Vec<HistoryEntry>>,
    /// Last entry id handed out, shared by all users
    last_entry_id: u64,
}

impl MemoryLedgerStore {
    fn read(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables
            .lock()
            .map_err(|err| Error::Unavailable(Box::new(ErasedPoisonError::from(err))))
    }

    fn write(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        self.tables
            .lock()
            .map_err(|err| Error::WriteFailed(Box::new(ErasedPoisonError::from(err))))
    }
}

#[async_trait::async_trait]
impl LedgerStorePort for MemoryLedgerStore {
    async fn select_balance(&self, user_id: UserId) -> Result<Balance, Error> {
        let balance = self
            .read()?
            .balances
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| Balance::empty(user_id));

        Ok(balance)
    }

    async fn upsert_balance(&self, user_id: UserId, points: u64) -> Result<Balance, Error> {
        let balance = Balance {
            user_id,
            points,
            updated_at: Utc::now(),
        };
        self.write()?.balances.insert(user_id, balance.clone());

        Ok(balance)
    }

    async fn append_history(
        &self,
        user_id: UserId,
        amount: u64,
        kind: TransactionType,
        occurred_at: DateTime<Utc>,
    ) -> Result<HistoryEntry, Error> {
        let mut tables = self.write()?;
        tables.last_entry_id += 1;
        let entry = HistoryEntry {
            entry_id: tables.last_entry_id,
            user_id,
            amount,
            kind,
            occurred_at,
        };
        tables
            .histories
            .entry(user_id)
            .or_default()
            .push(entry.clone());

        Ok(entry)
    }

    async fn select_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, Error> {
        let history = self
            .read()?
            .histories
            .get(&user_id)
            .cloned()
            .unwrap_or_default();

        Ok(history)
    }

    async fn remove_history(&self, user_id: UserId, entry_id: u64) -> Result<(), Error> {
        if let Some(history) = self.write()?.histories.get_mut(&user_id) {
            history.retain(|entry| entry.entry_id != entry_id);
        }

        Ok(())
    }
}

/// A panic happened while some call held the tables
///
/// Such a call may have stopped halfway through, so nothing it did can be trusted. Reads report
/// this as [`Error::Unavailable`]. Writes report it as [`Error::WriteFailed`] because they give up
/// before touching the tables, which is what the compensation in the commands expects.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for ErasedPoisonError {
    fn from(err: PoisonError<T>) -> Self {
        Self(err.to_string())
    }
}
