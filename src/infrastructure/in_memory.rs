use crate::domain::payout::{NewPayout, Payout, PayoutId, PayoutStatus};
use crate::domain::ports::{PayoutLease, PayoutStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// A thread-safe in-memory payout store.
///
/// Committed rows live in `rows`; each record additionally has an entry in
/// `row_locks` backing [`PayoutStore::lock`]. Plain reads go straight to the
/// committed state and never wait on a row lock. The maps are only held long
/// enough to find or insert an entry, so leases on different records never
/// contend with each other.
///
/// Clones share the same underlying state.
#[derive(Default, Clone)]
pub struct InMemoryPayoutStore {
    rows: Arc<RwLock<HashMap<PayoutId, Payout>>>,
    row_locks: Arc<RwLock<HashMap<PayoutId, Arc<Mutex<()>>>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryPayoutStore {
    /// Creates a new, empty in-memory payout store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayoutStore for InMemoryPayoutStore {
    async fn create(&self, new: NewPayout) -> Result<Payout> {
        let id = PayoutId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let now = Utc::now();
        let payout = Payout {
            id,
            amount: new.amount,
            currency: new.currency,
            recipient_details: new.recipient_details,
            comment: new.comment,
            status: PayoutStatus::Pending,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.insert(id, payout.clone());
        Ok(payout)
    }

    async fn get(&self, id: PayoutId) -> Result<Option<Payout>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn lock(&self, id: PayoutId) -> Result<Option<Box<dyn PayoutLease>>> {
        let row_lock = {
            if !self.rows.read().await.contains_key(&id) {
                return Ok(None);
            }
            let mut locks = self.row_locks.write().await;
            Arc::clone(locks.entry(id).or_default())
        };
        // Await the row lock without holding either map open.
        let guard = row_lock.lock_owned().await;
        match self.rows.read().await.get(&id).cloned() {
            Some(draft) => Ok(Some(Box::new(InMemoryLease {
                store: self.clone(),
                draft,
                _guard: guard,
            }))),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Payout>> {
        let mut payouts: Vec<Payout> = self.rows.read().await.values().cloned().collect();
        payouts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(payouts)
    }
}

struct InMemoryLease {
    store: InMemoryPayoutStore,
    draft: Payout,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl PayoutLease for InMemoryLease {
    fn payout(&self) -> &Payout {
        &self.draft
    }

    fn payout_mut(&mut self) -> &mut Payout {
        &mut self.draft
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.draft.updated_at = Utc::now();
        self.store.rows.write().await.insert(self.draft.id, self.draft.clone());
        // The row lock is released when `self` drops, after the write above.
        Ok(())
    }
}
