use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::customer::CustomerInfo;
use super::request::BookingRequest;
use super::room::RoomOption;

/// How long an idle booking session stays resumable.
pub const SESSION_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Search,
    Rooms,
    Customer,
    Summary,
    Success,
    Error,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Search => "search",
            FlowStep::Rooms => "rooms",
            FlowStep::Customer => "customer",
            FlowStep::Summary => "summary",
            FlowStep::Success => "success",
            FlowStep::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "rooms" => FlowStep::Rooms,
            "customer" => FlowStep::Customer,
            "summary" => FlowStep::Summary,
            "success" => FlowStep::Success,
            "error" => FlowStep::Error,
            _ => FlowStep::Search,
        }
    }
}

/// Server-held state of one guest's in-progress booking. Persisted between
/// requests and expired after [`SESSION_TTL_MINUTES`] of inactivity.
///
/// `reference` is generated once, before the first submission attempt, so a
/// retry after a failed submission reuses the same booking id instead of
/// creating a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSession {
    pub id: String,
    pub step: FlowStep,
    pub request: Option<BookingRequest>,
    pub room: Option<RoomOption>,
    pub customer: Option<CustomerInfo>,
    pub reference: Option<String>,
    pub failure: Option<String>,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl FlowSession {
    pub fn new(id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            step: FlowStep::Search,
            request: None,
            room: None,
            customer: None,
            reference: None,
            failure: None,
            last_activity: now,
            expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn touch(&mut self, now: NaiveDateTime) {
        self.last_activity = now;
        self.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
    }
}
