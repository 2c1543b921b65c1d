pub mod konnect;
pub mod simulated;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::Reservation;

/// Result of opening a payment with the gateway. The guest pays later via
/// `pay_url` (hosted page); the gateway reports the outcome on our webhook.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInit {
    pub payment_ref: String,
    pub pay_url: Option<String>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn initiate(&self, reservation: &Reservation) -> anyhow::Result<PaymentInit>;
}
