use chrono::{NaiveDate, NaiveDateTime};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::customer::CustomerInfo;
use super::room::RoomOption;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => ReservationStatus::Confirmed,
            "cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

/// The finalized booking record. Owns copies of the selected room and the
/// customer details; the flow controller never mutates it after creation —
/// status transitions belong to the back-office and the payment webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub room: RoomOption,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub nights: i64,
    pub subtotal: i64,
    pub taxes: i64,
    pub total: i64,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub payment_ref: Option<String>,
    pub customer: CustomerInfo,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Booking reference: fixed prefix, timestamp, short random suffix.
/// Visually distinct within a session, not a global uniqueness guarantee —
/// the store's primary key is what actually rejects duplicates.
pub fn new_reference(now: NaiveDateTime) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();
    format!("DDK-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}
