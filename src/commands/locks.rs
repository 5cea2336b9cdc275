use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::UserId;

type LockTable = HashMap<UserId, Arc<AsyncMutex<()>>>;

/// One async lock per user
///
/// A user's entry only lives while some task holds or waits for its lock.
#[derive(Clone, Debug, Default)]
pub struct UserLocks {
    table: Arc<Mutex<LockTable>>,
}

impl UserLocks {
    /// Wait until no other task holds the lock for `user_id`
    pub async fn acquire(&self, user_id: UserId) -> UserLockGuard {
        let lock = self
            .table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id)
            .or_default()
            .clone();

        // Built before waiting so that a cancelled waiter still cleans up the entry
        let mut held = UserLockGuard {
            user_id,
            table: self.table.clone(),
            lock,
            guard: None,
        };
        let acquiring = held.lock.clone().lock_owned();
        held.guard = Some(acquiring.await);

        held
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held for the duration of a read-validate-write sequence
///
/// While its `acquire` call is still waiting, the guard holds no lock but still owns a reference
/// to the user's entry.
#[derive(Debug)]
pub struct UserLockGuard {
    user_id: UserId,
    table: Arc<Mutex<LockTable>>,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        // Release first so that waiters can proceed. This is a no-op for a cancelled waiter.
        drop(self.guard.take());

        // The table and `self.lock` are the only references left when nobody else waits.
        // Clones are only handed out while holding the table, so this cannot race with a new
        // acquirer.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.user_id);
        }
    }
}
