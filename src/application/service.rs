use crate::domain::payout::{NewPayout, Payout, PayoutId, PayoutPatch, PayoutStatus};
use crate::domain::ports::{JobQueue, JobQueueRef, PayoutLease, PayoutStore, PayoutStoreRef};
use crate::error::{PayoutError, Result};
use std::time::Duration;
use tracing::{error, info};

/// Default delay between record creation and the first processing attempt.
pub const DEFAULT_ENQUEUE_DELAY: Duration = Duration::from_secs(5);

/// Creation and management facade over the record store and job queue.
///
/// Processing itself happens in the scheduler; this service covers the
/// surrounding record lifecycle: create-and-enqueue, reads filtered to
/// active records, restricted updates and soft deletion.
pub struct PayoutService {
    store: PayoutStoreRef,
    queue: JobQueueRef,
    enqueue_delay: Duration,
}

impl PayoutService {
    pub fn new(store: PayoutStoreRef, queue: JobQueueRef) -> Self {
        Self {
            store,
            queue,
            enqueue_delay: DEFAULT_ENQUEUE_DELAY,
        }
    }

    pub fn with_enqueue_delay(mut self, delay: Duration) -> Self {
        self.enqueue_delay = delay;
        self
    }

    /// Persists a new `Pending` record and queues it for processing.
    ///
    /// When the queue rejects the job the record is forced to `Failed` in
    /// the same flow and the error is returned to the caller; the scheduler
    /// never sees such a record.
    pub async fn create(&self, new: NewPayout) -> Result<Payout> {
        let payout = self.store.create(new).await?;
        info!(payout = %payout.id, amount = %payout.amount, currency = %payout.currency, "payout created");

        if let Err(err) = self.queue.submit(payout.id, self.enqueue_delay).await {
            error!(payout = %payout.id, %err, "failed to enqueue processing job");
            let mut lease = self
                .store
                .lock(payout.id)
                .await?
                .ok_or(PayoutError::NotFound(payout.id))?;
            lease.payout_mut().status = PayoutStatus::Failed;
            lease.commit().await?;
            return Err(err);
        }
        Ok(payout)
    }

    /// Active records only.
    pub async fn get(&self, id: PayoutId) -> Result<Payout> {
        match self.store.get(id).await? {
            Some(payout) if !payout.deleted => Ok(payout),
            _ => Err(PayoutError::NotFound(id)),
        }
    }

    /// Active records only, newest first.
    pub async fn list(&self) -> Result<Vec<Payout>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|payout| !payout.deleted)
            .collect())
    }

    /// Partial update limited to the status and comment fields.
    pub async fn update(&self, id: PayoutId, patch: PayoutPatch) -> Result<Payout> {
        let mut lease = self.store.lock(id).await?.ok_or(PayoutError::NotFound(id))?;
        if lease.payout().deleted {
            return Err(PayoutError::NotFound(id));
        }
        if let Some(status) = patch.status {
            lease.payout_mut().status = status;
        }
        if let Some(comment) = patch.comment {
            lease.payout_mut().comment = Some(comment);
        }
        lease.commit().await?;

        self.store
            .get(id)
            .await?
            .ok_or(PayoutError::NotFound(id))
    }

    /// Soft delete: marks the record cancelled without removing it.
    /// Deleting an already-deleted record is a no-op.
    pub async fn delete(&self, id: PayoutId) -> Result<()> {
        let mut lease = self.store.lock(id).await?.ok_or(PayoutError::NotFound(id))?;
        if lease.payout().deleted {
            return Ok(());
        }
        lease.payout_mut().deleted = true;
        lease.commit().await?;
        info!(payout = %id, "payout soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::processor::PayoutProcessor;
    use crate::application::scheduler::{PayoutScheduler, RetryPolicy, SchedulerConfig};
    use crate::domain::payout::Currency;
    use crate::domain::ports::PayoutStore;
    use crate::infrastructure::gateway::StaticGateway;
    use crate::infrastructure::in_memory::InMemoryPayoutStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn request(recipient: &str) -> NewPayout {
        NewPayout::new(dec!(25.50), Currency::Eur, recipient, None).unwrap()
    }

    /// Store, service and the (unstarted) scheduler backing its queue.
    fn harness() -> (InMemoryPayoutStore, PayoutService, PayoutScheduler) {
        let store = InMemoryPayoutStore::new();
        let processor = Arc::new(PayoutProcessor::new(
            Arc::new(store.clone()),
            Arc::new(StaticGateway::succeeding()),
        ));
        let (scheduler, queue) =
            PayoutScheduler::new(processor, RetryPolicy::default(), SchedulerConfig::default());
        let service = PayoutService::new(Arc::new(store.clone()), Arc::new(queue));
        (store, service, scheduler)
    }

    #[tokio::test]
    async fn test_create_returns_pending_record() {
        let (_store, service, _scheduler) = harness();

        let payout = service.create(request("acct-1")).await.unwrap();
        assert_eq!(payout.status, PayoutStatus::Pending);
        assert!(!payout.deleted);
    }

    #[tokio::test]
    async fn test_create_forces_failed_when_queue_is_down() {
        let (store, service, scheduler) = harness();
        drop(scheduler);

        let err = service.create(request("acct-1")).await.unwrap_err();
        assert!(matches!(err, PayoutError::QueueUnavailable(_)));

        let rows = store.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PayoutStatus::Failed);
    }

    #[tokio::test]
    async fn test_get_hides_soft_deleted_records() {
        let (_store, service, _scheduler) = harness();

        let payout = service.create(request("acct-1")).await.unwrap();
        service.delete(payout.id).await.unwrap();

        let err = service.get(payout.id).await.unwrap_err();
        assert!(matches!(err, PayoutError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_hides_deleted_and_orders_newest_first() {
        let (store, service, _scheduler) = harness();

        let first = service.create(request("acct-1")).await.unwrap();
        let second = service.create(request("acct-2")).await.unwrap();
        service.delete(first.id).await.unwrap();

        let active = service.list().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        // The store itself still knows both rows.
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_patches_status_and_comment_only() {
        let (_store, service, _scheduler) = harness();
        let payout = service.create(request("acct-1")).await.unwrap();

        let updated = service
            .update(
                payout.id,
                PayoutPatch {
                    status: None,
                    comment: Some("manual review".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, PayoutStatus::Pending);
        assert_eq!(updated.comment.as_deref(), Some("manual review"));

        let updated = service
            .update(
                payout.id,
                PayoutPatch {
                    status: Some(PayoutStatus::Failed),
                    comment: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, PayoutStatus::Failed);
        assert_eq!(updated.comment.as_deref(), Some("manual review"));
    }

    #[tokio::test]
    async fn test_update_on_deleted_record_is_not_found() {
        let (_store, service, _scheduler) = harness();
        let payout = service.create(request("acct-1")).await.unwrap();
        service.delete(payout.id).await.unwrap();

        let err = service
            .update(payout.id, PayoutPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PayoutError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, service, _scheduler) = harness();
        let payout = service.create(request("acct-1")).await.unwrap();

        service.delete(payout.id).await.unwrap();
        service.delete(payout.id).await.unwrap();

        let row = store.get(payout.id).await.unwrap().unwrap();
        assert!(row.deleted);
    }
}
