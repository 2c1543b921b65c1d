use std::sync::Arc;

use crate::db::queries;
use crate::models::ReservationEvent;
use crate::state::AppState;

/// Persists a back-office event and pushes it to live SSE subscribers.
/// Best-effort: an event that fails to record must never fail the booking.
pub fn record_reservation_event(state: &Arc<AppState>, reservation_id: &str, kind: &str, detail: &str) {
    let event_id = {
        let db = state.db.lock().unwrap();
        queries::insert_reservation_event(&db, reservation_id, kind, detail)
    };

    match event_id {
        Ok(id) => {
            let event = ReservationEvent {
                id,
                reservation_id: reservation_id.to_string(),
                kind: kind.to_string(),
                detail: detail.to_string(),
                created_at: chrono::Utc::now()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            };
            // Ignore send errors; no receivers just means nobody is watching
            let _ = state.events_tx.send(event);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to record reservation event");
        }
    }
}
