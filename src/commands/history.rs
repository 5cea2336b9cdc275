use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;

use crate::{
    domain::{HistoryEntry, UserId},
    ports::database::LedgerStorePort,
};

use super::{DomainLogic, Error};

/// All charges and uses of a user, oldest first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetHistoryRequest {
    pub user_id: UserId,
}

impl<D> Service<GetHistoryRequest> for DomainLogic<D>
where
    D: LedgerStorePort + Send + Sync + 'static,
{
    type Response = Vec<HistoryEntry>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetHistoryRequest) -> Self::Future {
        let database = self.database.clone();
        let locks = self.locks.clone();
        Box::pin(async move {
            let _guard = locks.acquire(req.user_id).await;
            Ok(database.select_history(req.user_id).await?)
        })
    }
}
