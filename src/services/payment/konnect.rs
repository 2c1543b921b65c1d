use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentInit, PaymentProvider};
use crate::models::Reservation;

pub struct KonnectProvider {
    api_key: String,
    wallet_id: String,
    base_url: String,
    currency: String,
    client: reqwest::Client,
}

impl KonnectProvider {
    pub fn new(api_key: String, wallet_id: String, base_url: String, currency: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key,
            wallet_id,
            base_url,
            currency,
            client,
        }
    }
}

#[derive(Deserialize)]
struct InitPaymentResponse {
    #[serde(rename = "paymentRef")]
    payment_ref: String,
    #[serde(rename = "payUrl")]
    pay_url: String,
}

#[async_trait]
impl PaymentProvider for KonnectProvider {
    async fn initiate(&self, reservation: &Reservation) -> anyhow::Result<PaymentInit> {
        let url = format!("{}/payments/init-payment", self.base_url);

        let body = serde_json::json!({
            "receiverWalletId": self.wallet_id,
            "amount": reservation.total,
            "token": self.currency,
            "orderId": reservation.id,
            "description": format!(
                "{} — {} to {}, {} guest(s)",
                reservation.room.name, reservation.check_in, reservation.check_out, reservation.guests
            ),
            "firstName": reservation.customer.first_name,
            "lastName": reservation.customer.last_name,
            "email": reservation.customer.email,
            "phoneNumber": reservation.customer.phone,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach Konnect")?
            .error_for_status()
            .context("Konnect API returned error")?;

        let init: InitPaymentResponse = response
            .json()
            .await
            .context("invalid Konnect init-payment response")?;

        Ok(PaymentInit {
            payment_ref: init.payment_ref,
            pay_url: Some(init.pay_url),
        })
    }
}
