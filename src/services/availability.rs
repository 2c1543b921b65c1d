use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{AvailabilityStatus, BookingRequest, RoomOption};

/// Joins the room catalog against the availability index for the requested
/// range and returns one option per room. Nothing here is persisted; options
/// are recomputed for every search.
pub fn room_options(conn: &Connection, request: &BookingRequest) -> anyhow::Result<Vec<RoomOption>> {
    let rooms = queries::list_rooms(conn)?;
    let mut options = Vec::with_capacity(rooms.len());
    for room in rooms {
        let status = range_status(conn, &room.id, request.check_in, request.check_out)?;
        options.push(RoomOption::from_room(&room, status));
    }
    Ok(options)
}

/// Recomputes the option for a single room, as a guard against a stale
/// status sent back by the client at selection time.
pub fn room_option(
    conn: &Connection,
    room_id: &str,
    request: &BookingRequest,
) -> anyhow::Result<Option<RoomOption>> {
    let room = match queries::get_room(conn, room_id)? {
        Some(room) => room,
        None => return Ok(None),
    };
    let status = range_status(conn, &room.id, request.check_in, request.check_out)?;
    Ok(Some(RoomOption::from_room(&room, status)))
}

/// Status of a room over [check_in, check_out): the check-out day itself is
/// not a night of the stay. All nights must be free for the room to be
/// Available; otherwise the earliest conflicting night decides the reported
/// status.
pub fn range_status(
    conn: &Connection,
    room_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<AvailabilityStatus> {
    let days = queries::get_unavailable_days(conn, room_id, check_in, check_out)?;
    Ok(days
        .into_iter()
        .next()
        .map(|(_, status)| status)
        .unwrap_or(AvailabilityStatus::Available))
}
