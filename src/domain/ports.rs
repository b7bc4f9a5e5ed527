use super::job::JobId;
use super::payout::{NewPayout, Payout, PayoutId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Exclusive lease over a single payout row.
///
/// The lease holds the row lock together with a working copy of the record.
/// Mutations apply to the working copy and only become visible to other
/// readers on [`commit`](PayoutLease::commit); dropping the lease without
/// committing discards them. Either way the lock is released, on every exit
/// path.
#[async_trait]
pub trait PayoutLease: Send {
    fn payout(&self) -> &Payout;
    fn payout_mut(&mut self) -> &mut Payout;
    /// Publishes the working copy and releases the row lock.
    async fn commit(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Persists a new record in `Pending` state and assigns its id.
    async fn create(&self, new: NewPayout) -> Result<Payout>;

    /// Plain read without locking. Soft-deleted rows are returned as well;
    /// callers that want active records apply the predicate themselves.
    async fn get(&self, id: PayoutId) -> Result<Option<Payout>>;

    /// Exclusive-locking read. Blocks until the row lock is available and
    /// returns `None` when the record does not exist.
    async fn lock(&self, id: PayoutId) -> Result<Option<Box<dyn PayoutLease>>>;

    /// All rows, soft-deleted included, newest first.
    async fn list(&self) -> Result<Vec<Payout>>;
}

/// Outcome reported by the payment gateway for one dispatch attempt.
///
/// A declined payout is a business outcome carried in `succeeded`; transport
/// faults surface as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayOutcome {
    pub succeeded: bool,
    pub elapsed: Duration,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn call(&self, payout: &Payout) -> Result<GatewayOutcome>;
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submits a deferred processing job for one record, to run no earlier
    /// than `delay` from now. Fails with
    /// [`QueueUnavailable`](crate::error::PayoutError::QueueUnavailable) when
    /// the backend cannot accept work.
    async fn submit(&self, payout_id: PayoutId, delay: Duration) -> Result<JobId>;
}

pub type PayoutStoreRef = Arc<dyn PayoutStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type JobQueueRef = Arc<dyn JobQueue>;
