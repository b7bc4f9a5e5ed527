use super::payout::PayoutId;
use std::fmt;
use std::time::Duration;

/// Handle returned by the queue when a job is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One deferred processing request for a single payout record.
///
/// Created once per record at creation time; owned by the scheduler until it
/// finishes, no-ops on a guard check, or is dropped after its retries run
/// out. `attempt` counts retries beyond the first execution.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub payout_id: PayoutId,
    pub delay: Duration,
    pub attempt: u32,
}
