use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;

use crate::{
    domain::{Balance, UserId},
    ports::database::LedgerStorePort,
};

use super::{DomainLogic, Error};

/// Current balance of a user
///
/// Users that were never charged have a balance of zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetBalanceRequest {
    pub user_id: UserId,
}

impl<D> Service<GetBalanceRequest> for DomainLogic<D>
where
    D: LedgerStorePort + Send + Sync + 'static,
{
    type Response = Balance;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetBalanceRequest) -> Self::Future {
        let database = self.database.clone();
        let locks = self.locks.clone();
        Box::pin(async move {
            // Waiting for in-flight writes keeps the balance consistent with the history
            let _guard = locks.acquire(req.user_id).await;
            Ok(database.select_balance(req.user_id).await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::database::memory::MemoryLedgerStore,
        config::LedgerConfig,
        ports::database::{Error as StoreError, MockLedgerStorePort},
    };
    use mockall::predicate::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_user() {
        // GIVEN a user that was never seen
        let domain = DomainLogic::new(
            Arc::new(MemoryLedgerStore::default()),
            &LedgerConfig::default(),
        );

        // WHEN retrieving their balance
        let res = domain.oneshot(GetBalanceRequest { user_id: 1 }).await;

        // THEN it is empty
        assert_that!(res)
            .is_ok()
            .matches(|balance| balance.user_id == 1 && balance.points == 0);
    }

    #[tokio::test]
    async fn test_reads_from_store() {
        let mut database = MockLedgerStorePort::new();
        database
            .expect_select_balance()
            .times(1)
            .with(eq(3))
            .returning(|user_id| {
                Ok(Balance {
                    points: 42,
                    ..Balance::empty(user_id)
                })
            });
        let domain = DomainLogic::new(Arc::new(database), &LedgerConfig::default());

        let res = domain.get_balance(3).await;

        assert_that!(res).is_ok().matches(|balance| balance.points == 42);
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let mut database = MockLedgerStorePort::new();
        database
            .expect_select_balance()
            .returning(|_| Err(StoreError::Unavailable("connection reset".into())));
        let domain = DomainLogic::new(Arc::new(database), &LedgerConfig::default());

        let res = domain.get_balance(3).await;

        assert_that!(res).is_err().matches(|err| err.code() == "E101");
    }
}
