use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingRequest, CustomerInfo, FlowSession, Reservation, RoomOption};
use crate::services::events::record_reservation_event;
use crate::services::flow::{self, SqliteReservationStore, StepView, Submission};
use crate::services::availability;
use crate::state::AppState;

fn load_session(state: &AppState, id: &str) -> Result<FlowSession, AppError> {
    let db = state.db.lock().unwrap();
    match queries::get_flow_session(&db, id)? {
        Some(session) => Ok(session),
        None => Err(AppError::SessionExpired),
    }
}

fn save_session(state: &AppState, session: &mut FlowSession) -> Result<(), AppError> {
    session.touch(Utc::now().naive_utc());
    let db = state.db.lock().unwrap();
    queries::save_flow_session(&db, session)?;
    Ok(())
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    #[serde(flatten)]
    pub view: StepView,
}

fn session_response(session: &FlowSession) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(SessionResponse {
        id: session.id.clone(),
        view: flow::view(session)?,
    }))
}

// POST /api/flow — open a new booking session
pub async fn start_flow(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, AppError> {
    let now = Utc::now().naive_utc();
    let mut session = FlowSession::new(uuid::Uuid::new_v4().to_string(), now);

    {
        let db = state.db.lock().unwrap();
        // Opportunistic housekeeping: drop sessions nobody will come back to
        if let Ok(n) = queries::expire_old_sessions(&db) {
            if n > 0 {
                tracing::debug!(count = n, "expired stale booking sessions");
            }
        }
    }
    save_session(&state, &mut session)?;

    tracing::info!(session = %session.id, "booking session opened");
    session_response(&session)
}

// GET /api/flow/:id — current step, projected per the rendering contract
pub async fn get_flow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = load_session(&state, &id)?;
    session_response(&session)
}

// POST /api/flow/:id/search
pub async fn submit_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut session = load_session(&state, &id)?;
    let today = Utc::now().date_naive();
    flow::submit_search(&mut session, request, today)?;
    save_session(&state, &mut session)?;
    session_response(&session)
}

// GET /api/flow/:id/rooms — options for the requested dates
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoomOption>>, AppError> {
    let session = load_session(&state, &id)?;
    let request = match (&session.step, &session.request) {
        (crate::models::FlowStep::Rooms, Some(request)) => request.clone(),
        _ => {
            return Err(AppError::Conflict(
                "room options are only shown on the rooms step".to_string(),
            ))
        }
    };

    let options = {
        let db = state.db.lock().unwrap();
        availability::room_options(&db, &request)?
    };
    Ok(Json(options))
}

#[derive(Deserialize)]
pub struct SelectRoomBody {
    pub room_id: String,
}

// POST /api/flow/:id/select
pub async fn select_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SelectRoomBody>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut session = load_session(&state, &id)?;
    let request = session
        .request
        .clone()
        .ok_or_else(|| AppError::Conflict("no dates selected yet".to_string()))?;

    // Recompute the option server-side; the client's copy may be stale
    let option = {
        let db = state.db.lock().unwrap();
        availability::room_option(&db, &body.room_id, &request)?
    }
    .ok_or_else(|| AppError::NotFound(format!("room {}", body.room_id)))?;

    flow::select_room(&mut session, option)?;
    save_session(&state, &mut session)?;
    session_response(&session)
}

// POST /api/flow/:id/customer
pub async fn submit_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(customer): Json<CustomerInfo>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut session = load_session(&state, &id)?;
    flow::submit_customer(&mut session, customer)?;
    save_session(&state, &mut session)?;
    session_response(&session)
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    #[serde(flatten)]
    pub view: StepView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_url: Option<String>,
}

// POST /api/flow/:id/confirm — submit from Summary, or retry from Error
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let mut session = load_session(&state, &id)?;
    let store = SqliteReservationStore::new(Arc::clone(&state.db));
    let now = Utc::now().naive_utc();

    let submission = flow::confirm(&mut session, &store, state.payment.as_ref(), now).await?;
    save_session(&state, &mut session)?;

    match submission {
        Submission::Completed { reservation, pay_url } => {
            record_reservation_event(
                &state,
                &reservation.id,
                "created",
                &format!(
                    "{} {}, {} — {} nights, total {}",
                    reservation.customer.first_name,
                    reservation.customer.last_name,
                    reservation.room.name,
                    reservation.nights,
                    reservation.total
                ),
            );
            Ok(Json(ConfirmResponse {
                view: flow::view(&session)?,
                reservation: Some(reservation),
                pay_url,
            }))
        }
        Submission::Failed { .. } => Ok(Json(ConfirmResponse {
            view: flow::view(&session)?,
            reservation: None,
            pay_url: None,
        })),
    }
}

// POST /api/flow/:id/back
pub async fn go_back(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut session = load_session(&state, &id)?;
    flow::go_back(&mut session)?;
    save_session(&state, &mut session)?;
    session_response(&session)
}

// POST /api/flow/:id/reset — the "new booking" action
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let mut session = load_session(&state, &id)?;
    flow::reset(&mut session);
    save_session(&state, &mut session)?;
    session_response(&session)
}
