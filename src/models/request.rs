use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::FieldError;

pub const MIN_GUESTS: u32 = 1;
pub const MAX_GUESTS: u32 = 6;

/// The search query that opens a booking: a date range and a party size.
/// Calendar dates only, no time component. Immutable once the flow has
/// advanced past the search step (going back to search replaces it).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
}

impl BookingRequest {
    /// Number of nights covered, check-out day exclusive.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), FieldError> {
        if self.check_in < today {
            return Err(FieldError::new(
                "check_in",
                "check-in date cannot be in the past",
            ));
        }
        if self.check_out <= self.check_in {
            return Err(FieldError::new(
                "check_out",
                "check-out must be at least one day after check-in",
            ));
        }
        if self.guests < MIN_GUESTS || self.guests > MAX_GUESTS {
            return Err(FieldError::new(
                "guests",
                format!("guest count must be between {MIN_GUESTS} and {MAX_GUESTS}"),
            ));
        }
        Ok(())
    }
}
