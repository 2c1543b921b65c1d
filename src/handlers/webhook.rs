use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use crate::db::queries;
use crate::models::{PaymentStatus, ReservationStatus};
use crate::services::events::record_reservation_event;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PaymentWebhookPayload {
    pub order_id: String,
    pub payment_ref: Option<String>,
    pub status: String,
}

fn validate_signature(secret: &str, signature: &str, body: &str) -> bool {
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body.as_bytes());
    let result = mac.finalize().into_bytes();
    let expected = base64::engine::general_purpose::STANDARD.encode(result);

    expected == signature
}

// POST /webhook/payment — gateway notification for a payment outcome
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    // Validate gateway signature (skip if secret is empty — dev mode)
    if !state.config.konnect_webhook_secret.is_empty() {
        let signature = headers
            .get("x-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Signature header on payment webhook");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        if !validate_signature(&state.config.konnect_webhook_secret, signature, &body) {
            tracing::warn!("invalid payment webhook signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let payload: PaymentWebhookPayload = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "malformed payment webhook payload");
            return (StatusCode::BAD_REQUEST, "Malformed payload").into_response();
        }
    };

    tracing::info!(
        reservation = %payload.order_id,
        status = %payload.status,
        "payment webhook received"
    );

    let paid = matches!(payload.status.as_str(), "completed" | "paid" | "success");
    let payment_status = if paid {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    };

    let found = {
        let db = state.db.lock().unwrap();
        let found = match queries::update_payment_status(
            &db,
            &payload.order_id,
            &payment_status,
            payload.payment_ref.as_deref(),
        ) {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(error = %e, "failed to update payment status");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        };

        if found && paid {
            if let Err(e) =
                queries::update_reservation_status(&db, &payload.order_id, &ReservationStatus::Confirmed)
            {
                tracing::error!(error = %e, "failed to confirm reservation after payment");
            }
        }
        found
    };

    if !found {
        tracing::warn!(reservation = %payload.order_id, "payment webhook for unknown reservation");
        return (StatusCode::NOT_FOUND, "Unknown reservation").into_response();
    }

    let kind = if paid { "payment_received" } else { "payment_failed" };
    record_reservation_event(
        &state,
        &payload.order_id,
        kind,
        &format!("gateway reported status {}", payload.status),
    );

    (StatusCode::OK, "OK").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_hmac_sha1_base64() {
        let body = r#"{"order_id":"abc","status":"completed"}"#;
        let mut mac = Hmac::<Sha1>::new_from_slice(b"secret").unwrap();
        mac.update(body.as_bytes());
        let signature =
            base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        assert!(validate_signature("secret", &signature, body));
        assert!(!validate_signature("other-secret", &signature, body));
        assert!(!validate_signature("secret", &signature, "tampered body"));
    }

    #[test]
    fn test_signature_rejects_garbage() {
        assert!(!validate_signature("secret", "not-base64-hmac", "body"));
    }
}
