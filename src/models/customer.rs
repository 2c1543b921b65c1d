use serde::{Deserialize, Serialize};

use crate::errors::FieldError;

/// Contact details collected at the customer step. All fields except
/// special_requests are required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub special_requests: Option<String>,
}

impl CustomerInfo {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.first_name.trim().is_empty() {
            return Err(FieldError::new("first_name", "first name is required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(FieldError::new("last_name", "last name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(FieldError::new("email", "email is required"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(FieldError::new("email", "email address is not valid"));
        }
        if self.phone.trim().is_empty() {
            return Err(FieldError::new("phone", "phone number is required"));
        }
        Ok(())
    }
}

/// Syntactic check only: one '@', non-empty local part, dotted domain,
/// no whitespace. Deliverability is not our problem here.
fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let dot = match domain.rfind('.') {
        Some(i) => i,
        None => return false,
    };
    dot > 0 && dot < domain.len() - 1
}
