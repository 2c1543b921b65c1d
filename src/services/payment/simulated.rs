use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{PaymentInit, PaymentProvider};
use crate::models::Reservation;

/// Stand-in for the Konnect gateway when no API key is configured: waits a
/// moment, then declines a fixed share of attempts so both flow outcomes
/// stay reachable in demos.
pub struct SimulatedProvider {
    failure_percent: u32,
    delay_ms: u64,
}

impl SimulatedProvider {
    pub fn new(failure_percent: u32) -> Self {
        Self {
            failure_percent: failure_percent.min(100),
            delay_ms: 400,
        }
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    async fn initiate(&self, reservation: &Reservation) -> anyhow::Result<PaymentInit> {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        let roll = rand::thread_rng().gen_range(0..100);
        if roll < self.failure_percent {
            anyhow::bail!("simulated gateway declined the payment");
        }

        Ok(PaymentInit {
            payment_ref: format!("SIM-{}", reservation.id),
            pay_url: None,
        })
    }
}
