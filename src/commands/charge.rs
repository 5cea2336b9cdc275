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

/// Add points to the balance of a user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChargeRequest {
    pub user_id: UserId,
    /// Number of points to add
    ///
    /// Anything below 1 is rejected.
    pub amount: i64,
}

impl<D> Service<ChargeRequest> for DomainLogic<D>
where
    D: LedgerStorePort + Send + Sync + 'static,
{
    type Response = Balance;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ChargeRequest) -> Self::Future {
        let database = self.database.clone();
        let locks = self.locks.clone();
        let policy = self.policy;
        Box::pin(async move {
            let ChargeRequest { user_id, amount } = req;
            if !policy.is_chargeable(amount) {
                debug!(user_id, amount, "charge rejected: invalid amount");
                return Err(Error::InvalidAmount { requested: amount });
            }

            run_detached(async move {
                let _guard = locks.acquire(user_id).await;
                let before = database.select_balance(user_id).await?;
                if !policy.can_add_without_exceeding_ceiling(before.points, amount) {
                    debug!(
                        user_id,
                        amount,
                        points = before.points,
                        "charge rejected: ceiling exceeded"
                    );
                    return Err(Error::BalanceCeilingExceeded {
                        current: before.points,
                        requested: amount,
                        ceiling: policy.max_balance(),
                    });
                }

                // Both checks above guarantee that this neither wraps nor exceeds the ceiling
                let amount = amount.unsigned_abs();
                let updated = commit(
                    database.as_ref(),
                    user_id,
                    before.points + amount,
                    amount,
                    TransactionType::Charge,
                )
                .await?;

                info!(user_id, amount, points = updated.points, "points charged");
                Ok(updated)
            })
            .await
        })
    }
}
