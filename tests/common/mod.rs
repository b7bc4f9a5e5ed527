#![allow(dead_code)]

use async_trait::async_trait;
use payout_pipeline::domain::payout::{Currency, NewPayout, Payout, PayoutId};
use payout_pipeline::domain::ports::{GatewayOutcome, PaymentGateway, PayoutLease, PayoutStore};
use payout_pipeline::error::{PayoutError, Result};
use payout_pipeline::infrastructure::in_memory::InMemoryPayoutStore;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

pub fn new_request() -> NewPayout {
    NewPayout::new(dec!(10.00), Currency::Usd, "acct-0001", None).unwrap()
}

/// Gateway double that signals when a call enters and blocks until the test
/// releases it, pinning the execution between claim and finalize.
pub struct RendezvousGateway {
    entered: mpsc::UnboundedSender<()>,
    release: Arc<Semaphore>,
    succeed: bool,
}

impl RendezvousGateway {
    pub fn new(succeed: bool) -> (Self, mpsc::UnboundedReceiver<()>, Arc<Semaphore>) {
        let (entered, entered_rx) = mpsc::unbounded_channel();
        let release = Arc::new(Semaphore::new(0));
        let gateway = Self {
            entered,
            release: Arc::clone(&release),
            succeed,
        };
        (gateway, entered_rx, release)
    }
}

#[async_trait]
impl PaymentGateway for RendezvousGateway {
    async fn call(&self, _payout: &Payout) -> Result<GatewayOutcome> {
        let _ = self.entered.send(());
        let permit = self
            .release
            .acquire()
            .await
            .map_err(|_| PayoutError::Gateway("release semaphore closed".to_string()))?;
        permit.forget();
        Ok(GatewayOutcome {
            succeeded: self.succeed,
            elapsed: Duration::ZERO,
        })
    }
}

/// Store wrapper that counts lock acquisitions and can make every lock fail,
/// for driving the scheduler's retry path.
#[derive(Clone)]
pub struct CountingStore {
    inner: InMemoryPayoutStore,
    lock_calls: Arc<AtomicU32>,
    fail_locks: bool,
}

impl CountingStore {
    pub fn passthrough() -> Self {
        Self {
            inner: InMemoryPayoutStore::new(),
            lock_calls: Arc::new(AtomicU32::new(0)),
            fail_locks: false,
        }
    }

    pub fn failing_locks() -> Self {
        Self {
            fail_locks: true,
            ..Self::passthrough()
        }
    }

    pub fn inner(&self) -> &InMemoryPayoutStore {
        &self.inner
    }

    pub fn lock_count(&self) -> u32 {
        self.lock_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PayoutStore for CountingStore {
    async fn create(&self, new: NewPayout) -> Result<Payout> {
        self.inner.create(new).await
    }

    async fn get(&self, id: PayoutId) -> Result<Option<Payout>> {
        self.inner.get(id).await
    }

    async fn lock(&self, id: PayoutId) -> Result<Option<Box<dyn PayoutLease>>> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_locks {
            return Err(PayoutError::Storage("row lock unavailable".to_string()));
        }
        self.inner.lock(id).await
    }

    async fn list(&self) -> Result<Vec<Payout>> {
        self.inner.list().await
    }
}
