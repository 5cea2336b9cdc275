use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;
use tracing::{debug, info};

use crate::{
    domain::{Balance, TransactionType, UserId},
    ports::database::LedgerStorePort,
};

use super::{commit, run_detached, DomainLogic, Error};

/// Spend points from the balance of a user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsePointsRequest {
    pub user_id: UserId,
    /// Number of points to remove
    pub amount: i64,
}

impl<D> Service<UsePointsRequest> for DomainLogic<D>
where
    D: LedgerStorePort + Send + Sync + 'static,
{
    type Response = Balance;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UsePointsRequest) -> Self::Future {
        let database = self.database.clone();
        let locks = self.locks.clone();
        let policy = self.policy;
        Box::pin(async move {
            let UsePointsRequest { user_id, amount } = req;
            if !policy.is_usable(amount) {
                debug!(user_id, amount, "use rejected: invalid amount");
                return Err(Error::InvalidAmount { requested: amount });
            }

            run_detached(async move {
                let _guard = locks.acquire(user_id).await;
                let before = database.select_balance(user_id).await?;
                if !policy.has_sufficient_balance(before.points, amount) {
                    debug!(
                        user_id,
                        amount,
                        points = before.points,
                        "use rejected: insufficient balance"
                    );
                    return Err(Error::InsufficientBalance {
                        current: before.points,
                        requested: amount,
                    });
                }

                let amount = amount.unsigned_abs();
                let updated = commit(
                    database.as_ref(),
                    user_id,
                    before.points - amount,
                    amount,
                    TransactionType::Use,
                )
                .await?;

                info!(user_id, amount, points = updated.points, "points used");
                Ok(updated)
            })
            .await
        })
    }
}
