use crate::domain::payout::{Payout, PayoutId, PayoutStatus};
use crate::domain::ports::{PaymentGateway, PaymentGatewayRef, PayoutLease, PayoutStore, PayoutStoreRef};
use crate::error::{PayoutError, Result};
use tracing::{info, warn};

/// Result of one full processing pass over a record.
///
/// The skip variants are legitimate idempotent outcomes, not errors; only
/// technical faults surface as `Err` and reach the scheduler's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Gateway accepted the payout; the record moved to `Completed`.
    Completed,
    /// Gateway declined the payout; the record moved to `Failed`.
    Failed,
    /// The record was cancelled before processing began; nothing changed.
    AlreadyDeleted,
    /// Another execution claimed the record first, or it already finished.
    AlreadyClaimed,
    /// The record was cancelled while the gateway call was in flight; it
    /// stays in `Processing`.
    DeletedMidFlight,
}

/// Advances one payout through `Pending -> Processing -> Completed | Failed`.
///
/// The claim and finalize steps each run under their own row lease; the
/// gateway call in between holds no lock, so a slow gateway never starves
/// workers contending for other records. The claim is the sole
/// synchronization point: among any number of concurrent executions, only the
/// one that observes `Pending` under the lease proceeds.
pub struct PayoutProcessor {
    store: PayoutStoreRef,
    gateway: PaymentGatewayRef,
}

enum Claim {
    Granted(Payout),
    Skipped(ProcessOutcome),
}

impl PayoutProcessor {
    pub fn new(store: PayoutStoreRef, gateway: PaymentGatewayRef) -> Self {
        Self { store, gateway }
    }

    pub async fn run(&self, id: PayoutId) -> Result<ProcessOutcome> {
        info!(payout = %id, "processing payout");

        let payout = match self.claim(id).await? {
            Claim::Granted(payout) => payout,
            Claim::Skipped(outcome) => return Ok(outcome),
        };

        // Unlocked: a concurrent soft delete during this window is only
        // observed at finalize time.
        let outcome = self.gateway.call(&payout).await?;
        let final_status = if outcome.succeeded {
            PayoutStatus::Completed
        } else {
            PayoutStatus::Failed
        };

        self.finalize(id, final_status).await
    }

    /// Phase A: the guarded `Pending -> Processing` transition.
    async fn claim(&self, id: PayoutId) -> Result<Claim> {
        let mut lease = self.store.lock(id).await?.ok_or(PayoutError::NotFound(id))?;

        if lease.payout().deleted {
            info!(payout = %id, "already deleted, skipping");
            return Ok(Claim::Skipped(ProcessOutcome::AlreadyDeleted));
        }
        if lease.payout().status != PayoutStatus::Pending {
            warn!(payout = %id, status = %lease.payout().status, "already claimed or finished");
            return Ok(Claim::Skipped(ProcessOutcome::AlreadyClaimed));
        }

        lease.payout_mut().status = PayoutStatus::Processing;
        let snapshot = lease.payout().clone();
        lease.commit().await?;
        Ok(Claim::Granted(snapshot))
    }

    /// Phase C: publish the gateway verdict unless the record was cancelled
    /// in the meantime.
    async fn finalize(&self, id: PayoutId, final_status: PayoutStatus) -> Result<ProcessOutcome> {
        let mut lease = self.store.lock(id).await?.ok_or(PayoutError::NotFound(id))?;

        if lease.payout().deleted {
            // Cancelled mid-flight: the terminal transition is skipped on
            // purpose and the record stays in `Processing`.
            info!(payout = %id, "deleted after claim, leaving status untouched");
            return Ok(ProcessOutcome::DeletedMidFlight);
        }

        lease.payout_mut().status = final_status;
        lease.commit().await?;

        info!(payout = %id, status = %final_status, "payout finished");
        Ok(match final_status {
            PayoutStatus::Completed => ProcessOutcome::Completed,
            _ => ProcessOutcome::Failed,
        })
    }
}
