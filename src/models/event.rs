use serde::{Deserialize, Serialize};

/// Back-office activity feed entry, broadcast over SSE and persisted for
/// reconnect catch-up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReservationEvent {
    pub id: i64,
    pub reservation_id: String,
    pub kind: String,
    pub detail: String,
    pub created_at: String,
}
