use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RoomSummary {
    id: String,
    name: String,
    category: String,
    price_per_night: i64,
    capacity: u32,
    description: Option<String>,
}

// GET /api/rooms — public catalog for the site's rooms page
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = {
        let db = state.db.lock().unwrap();
        queries::list_rooms(&db)?
    };

    let response = rooms
        .into_iter()
        .map(|r| RoomSummary {
            id: r.id,
            name: r.name,
            category: r.category.as_str().to_string(),
            price_per_night: r.price_per_night,
            capacity: r.capacity,
            description: r.description,
        })
        .collect();

    Ok(Json(response))
}
