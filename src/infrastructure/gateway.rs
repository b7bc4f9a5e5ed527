use crate::domain::payout::Payout;
use crate::domain::ports::{GatewayOutcome, PaymentGateway};
use crate::error::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Tuning knobs for the simulated gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Probability that a dispatch is reported as succeeded.
    pub success_ratio: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            min_latency: Duration::from_secs(2),
            max_latency: Duration::from_secs(5),
            success_ratio: 0.75,
        }
    }
}

/// Stand-in for the external payment gateway.
///
/// Sleeps for a latency drawn uniformly from the configured range, then
/// reports success with the configured probability. A production
/// implementation performs the real call behind the same
/// [`PaymentGateway`] contract.
pub struct SimulatedGateway {
    config: GatewayConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded variant producing a reproducible latency/outcome sequence.
    pub fn seeded(config: GatewayConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn call(&self, payout: &Payout) -> Result<GatewayOutcome> {
        let (latency, succeeded) = {
            let mut rng = self.rng.lock().await;
            let latency = rng.gen_range(self.config.min_latency..=self.config.max_latency);
            (latency, rng.gen_bool(self.config.success_ratio))
        };
        debug!(payout = %payout.id, latency_ms = latency.as_millis() as u64, "dispatching to payment gateway");
        tokio::time::sleep(latency).await;
        Ok(GatewayOutcome {
            succeeded,
            elapsed: latency,
        })
    }
}

/// Deterministic gateway with a fixed outcome and latency, for tests and
/// wiring experiments.
pub struct StaticGateway {
    pub succeed: bool,
    pub latency: Duration,
}

impl StaticGateway {
    pub fn succeeding() -> Self {
        Self {
            succeed: true,
            latency: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            latency: Duration::ZERO,
        }
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn call(&self, _payout: &Payout) -> Result<GatewayOutcome> {
        tokio::time::sleep(self.latency).await;
        Ok(GatewayOutcome {
            succeeded: self.succeed,
            elapsed: self.latency,
        })
    }
}
