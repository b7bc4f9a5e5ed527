use crate::application::processor::PayoutProcessor;
use crate::domain::job::{Job, JobId};
use crate::domain::payout::PayoutId;
use crate::domain::ports::JobQueue;
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Retry behaviour for technical failures.
///
/// Owned by the scheduler, decoupled from the three processing phases. The
/// delay before retry `n` is `base_delay * multiplier^n`, optionally reduced
/// by full jitter (drawn uniformly between zero and the computed backoff) to
/// avoid synchronized retry storms.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed beyond the first execution.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(7),
            multiplier: 2,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt));
        if self.jitter && backoff > Duration::ZERO {
            rng.gen_range(Duration::ZERO..=backoff)
        } else {
            backoff
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upper bound on concurrently executing workers.
    pub worker_count: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { worker_count: 4 }
    }
}

/// Submission handle for the scheduler, implementing [`JobQueue`].
///
/// Clones feed the same scheduler. Once the scheduler is gone, submissions
/// fail with `QueueUnavailable`.
#[derive(Clone)]
pub struct SchedulerQueue {
    tx: mpsc::UnboundedSender<Job>,
    next_id: Arc<AtomicU64>,
}

#[async_trait]
impl JobQueue for SchedulerQueue {
    async fn submit(&self, payout_id: PayoutId, delay: Duration) -> Result<JobId> {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let job = Job {
            id,
            payout_id,
            delay,
            attempt: 0,
        };
        self.tx
            .send(job)
            .map_err(|_| PayoutError::QueueUnavailable("scheduler is not running".to_string()))?;
        Ok(id)
    }
}

/// Executes due jobs on a bounded worker pool, retrying technical failures
/// with exponential backoff and jitter.
///
/// No ordering is guaranteed across distinct jobs; jobs for different
/// records run concurrently in any order.
pub struct PayoutScheduler {
    rx: mpsc::UnboundedReceiver<Job>,
    processor: Arc<PayoutProcessor>,
    policy: RetryPolicy,
    workers: Arc<Semaphore>,
}

impl PayoutScheduler {
    pub fn new(
        processor: Arc<PayoutProcessor>,
        policy: RetryPolicy,
        config: SchedulerConfig,
    ) -> (Self, SchedulerQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = SchedulerQueue {
            tx,
            next_id: Arc::new(AtomicU64::new(0)),
        };
        let scheduler = Self {
            rx,
            processor,
            policy,
            workers: Arc::new(Semaphore::new(config.worker_count)),
        };
        (scheduler, queue)
    }

    /// Runs until every [`SchedulerQueue`] handle is dropped and all accepted
    /// jobs have finished.
    pub async fn run(mut self) {
        let mut tasks = JoinSet::new();
        while let Some(job) = self.rx.recv().await {
            let processor = Arc::clone(&self.processor);
            let policy = self.policy.clone();
            let workers = Arc::clone(&self.workers);
            tasks.spawn(execute(processor, policy, workers, job));
        }
        while tasks.join_next().await.is_some() {}
    }
}

async fn execute(
    processor: Arc<PayoutProcessor>,
    policy: RetryPolicy,
    workers: Arc<Semaphore>,
    mut job: Job,
) {
    tokio::time::sleep(job.delay).await;
    loop {
        let result = {
            // The permit is held only while the processor runs, never across
            // backoff sleeps.
            let Ok(_permit) = workers.acquire().await else {
                return;
            };
            processor.run(job.payout_id).await
        };
        match result {
            Ok(outcome) => {
                info!(job = %job.id, payout = %job.payout_id, ?outcome, "job finished");
                return;
            }
            Err(PayoutError::NotFound(id)) => {
                // Absent record, as opposed to soft-deleted: terminal, never
                // retried.
                error!(job = %job.id, payout = %id, "payout does not exist, dropping job");
                return;
            }
            Err(err) if job.attempt >= policy.max_attempts => {
                error!(
                    job = %job.id,
                    payout = %job.payout_id,
                    executions = job.attempt + 1,
                    %err,
                    "retries exhausted, dropping job"
                );
                return;
            }
            Err(err) => {
                let delay = policy.delay_for(job.attempt, &mut rand::thread_rng());
                job.attempt += 1;
                warn!(
                    job = %job.id,
                    payout = %job.payout_id,
                    attempt = job.attempt,
                    delay_ms = delay.as_millis() as u64,
                    %err,
                    "technical failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
