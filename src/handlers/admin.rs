use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::db::queries;
use crate::errors::{AppError, FieldError};
use crate::models::{AvailabilityStatus, Reservation, ReservationStatus, Room, RoomCategory};
use crate::services::events::record_reservation_event;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    rooms_count: i64,
    pending_reservations: i64,
    confirmed_reservations: i64,
    upcoming_arrivals: i64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db, Utc::now().date_naive())?
    };

    Ok(Json(StatusResponse {
        rooms_count: stats.rooms_count,
        pending_reservations: stats.pending_count,
        confirmed_reservations: stats.confirmed_count,
        upcoming_arrivals: stats.upcoming_arrivals,
    }))
}

// GET /api/admin/reservations
#[derive(Deserialize)]
pub struct ReservationsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_reservations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ReservationsQuery>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let reservations = {
        let db = state.db.lock().unwrap();
        queries::list_reservations(&db, query.status.as_deref(), limit)?
    };
    Ok(Json(reservations))
}

// POST /api/admin/reservations/:id/confirm
pub async fn confirm_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    set_reservation_status(&state, &id, ReservationStatus::Confirmed, "confirmed")
}

// POST /api/admin/reservations/:id/cancel
pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    set_reservation_status(&state, &id, ReservationStatus::Cancelled, "cancelled")
}

fn set_reservation_status(
    state: &Arc<AppState>,
    id: &str,
    status: ReservationStatus,
    kind: &str,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_reservation_status(&db, id, &status)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("reservation {id}")));
    }

    record_reservation_event(state, id, kind, &format!("reservation {kind} by the back-office"));
    Ok(Json(serde_json::json!({"ok": true, "status": status.as_str()})))
}

// ── Room management ──

#[derive(Deserialize)]
pub struct RoomBody {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price_per_night: i64,
    pub capacity: u32,
    pub description: Option<String>,
}

fn parse_room_body(body: RoomBody) -> Result<Room, AppError> {
    if body.id.trim().is_empty() {
        return Err(AppError::Validation(FieldError::new("id", "room id is required")));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation(FieldError::new("name", "room name is required")));
    }
    let category = RoomCategory::parse(&body.category).ok_or_else(|| {
        AppError::Validation(FieldError::new(
            "category",
            format!("unknown category: {}", body.category),
        ))
    })?;
    if body.price_per_night <= 0 {
        return Err(AppError::Validation(FieldError::new(
            "price_per_night",
            "nightly price must be positive",
        )));
    }
    if body.capacity < 1 {
        return Err(AppError::Validation(FieldError::new(
            "capacity",
            "capacity must be at least 1",
        )));
    }

    Ok(Room {
        id: body.id.trim().to_string(),
        name: body.name.trim().to_string(),
        category,
        price_per_night: body.price_per_night,
        capacity: body.capacity,
        description: body.description,
    })
}

// GET /api/admin/rooms
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Room>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let rooms = {
        let db = state.db.lock().unwrap();
        queries::list_rooms(&db)?
    };
    Ok(Json(rooms))
}

// POST /api/admin/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RoomBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let room = parse_room_body(body)?;

    {
        let db = state.db.lock().unwrap();
        if queries::get_room(&db, &room.id)?.is_some() {
            return Err(AppError::Conflict(format!("room {} already exists", room.id)));
        }
        queries::create_room(&db, &room)?;
    }

    tracing::info!(room = %room.id, "room created");
    Ok(Json(serde_json::json!({"ok": true})))
}

// POST /api/admin/rooms/:id
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<RoomBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    body.id = id;
    let room = parse_room_body(body)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_room(&db, &room)?
    };

    if !updated {
        return Err(AppError::NotFound(format!("room {}", room.id)));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// POST /api/admin/rooms/:id/delete
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let removed = {
        let db = state.db.lock().unwrap();
        queries::delete_room(&db, &id)?
    };

    if !removed {
        return Err(AppError::NotFound(format!("room {id}")));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// ── Availability management ──

#[derive(Deserialize)]
pub struct DaysQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Serialize)]
pub struct DayStatus {
    day: NaiveDate,
    status: String,
}

// GET /api/admin/rooms/:id/days
pub async fn get_room_days(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<DayStatus>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let days = {
        let db = state.db.lock().unwrap();
        queries::get_unavailable_days(&db, &id, query.from, query.to)?
    };

    Ok(Json(
        days.into_iter()
            .map(|(day, status)| DayStatus {
                day,
                status: status.as_str().to_string(),
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct SetDaysBody {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub status: String,
}

// POST /api/admin/rooms/:id/days — mark a night range, `to` exclusive
pub async fn set_room_days(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<SetDaysBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.to <= body.from {
        return Err(AppError::Validation(FieldError::new(
            "to",
            "range end must be after range start",
        )));
    }
    let status = AvailabilityStatus::parse(&body.status);

    let affected = {
        let db = state.db.lock().unwrap();
        if queries::get_room(&db, &id)?.is_none() {
            return Err(AppError::NotFound(format!("room {id}")));
        }
        queries::set_room_days(&db, &id, body.from, body.to, status)?
    };

    Ok(Json(serde_json::json!({"ok": true, "days": affected})))
}

// GET /api/admin/events — SSE stream of reservation activity
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
    pub last_id: Option<i64>,
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Auth via query param (EventSource can't set headers)
    let token = query.token.as_deref().unwrap_or("");
    if token != state.config.admin_token {
        return Err(AppError::Unauthorized);
    }

    let last_id = query.last_id.unwrap_or(0);

    // Catch up on missed events from the database
    let catchup_events = {
        let db = state.db.lock().unwrap();
        queries::get_events_since(&db, last_id).unwrap_or_default()
    };

    let rx = state.events_tx.subscribe();

    let catchup_stream = tokio_stream::iter(catchup_events.into_iter().map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("reservation_event"))
    }));

    let live_stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("reservation_event")))
        }
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    let keepalive_stream = tokio_stream::StreamExt::map(
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30))),
        |_| Ok(Event::default().comment("keepalive")),
    );

    let combined = catchup_stream.chain(live_stream);
    let merged = StreamExt::merge(combined, keepalive_stream);

    Ok(Sse::new(merged))
}
