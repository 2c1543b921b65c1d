use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::models::{
    AvailabilityStatus, BookingRequest, CustomerInfo, FlowSession, FlowStep, PaymentStatus,
    Reservation, ReservationEvent, ReservationStatus, Room, RoomCategory, RoomOption,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Rooms ──

pub fn create_room(conn: &Connection, room: &Room) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO rooms (id, name, category, price_per_night, capacity, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            room.id,
            room.name,
            room.category.as_str(),
            room.price_per_night,
            room.capacity as i64,
            room.description,
        ],
    )?;
    Ok(())
}

pub fn list_rooms(conn: &Connection) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, price_per_night, capacity, description FROM rooms ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_room_row(row)))?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row??);
    }
    Ok(rooms)
}

pub fn get_room(conn: &Connection, id: &str) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        "SELECT id, name, category, price_per_night, capacity, description FROM rooms WHERE id = ?1",
        params![id],
        |row| Ok(parse_room_row(row)),
    );

    match result {
        Ok(room) => Ok(Some(room?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_room(conn: &Connection, room: &Room) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE rooms SET name = ?1, category = ?2, price_per_night = ?3, capacity = ?4, description = ?5
         WHERE id = ?6",
        params![
            room.name,
            room.category.as_str(),
            room.price_per_night,
            room.capacity as i64,
            room.description,
            room.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_room(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_room_row(row: &rusqlite::Row) -> anyhow::Result<Room> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let category_str: String = row.get(2)?;
    let price_per_night: i64 = row.get(3)?;
    let capacity: i64 = row.get(4)?;
    let description: Option<String> = row.get(5)?;

    let category = RoomCategory::parse(&category_str)
        .ok_or_else(|| anyhow::anyhow!("unknown room category stored: {category_str}"))?;

    Ok(Room {
        id,
        name,
        category,
        price_per_night,
        capacity: capacity as u32,
        description,
    })
}

// ── Availability index ──

/// Writes the status of every night in [from, to). Setting Available removes
/// the stored rows, since absence means available.
pub fn set_room_days(
    conn: &Connection,
    room_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    status: AvailabilityStatus,
) -> anyhow::Result<usize> {
    let mut affected = 0;
    let mut day = from;
    while day < to {
        let day_str = day.format(DATE_FMT).to_string();
        affected += match status {
            AvailabilityStatus::Available => conn.execute(
                "DELETE FROM room_days WHERE room_id = ?1 AND day = ?2",
                params![room_id, day_str],
            )?,
            other => conn.execute(
                "INSERT INTO room_days (room_id, day, status) VALUES (?1, ?2, ?3)
                 ON CONFLICT(room_id, day) DO UPDATE SET status = excluded.status",
                params![room_id, day_str, other.as_str()],
            )?,
        };
        day += Duration::days(1);
    }
    Ok(affected)
}

/// Blocked nights of a room in [from, to), ascending by date.
pub fn get_unavailable_days(
    conn: &Connection,
    room_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<(NaiveDate, AvailabilityStatus)>> {
    let mut stmt = conn.prepare(
        "SELECT day, status FROM room_days
         WHERE room_id = ?1 AND day >= ?2 AND day < ?3 ORDER BY day ASC",
    )?;

    let rows = stmt.query_map(
        params![
            room_id,
            from.format(DATE_FMT).to_string(),
            to.format(DATE_FMT).to_string()
        ],
        |row| {
            let day_str: String = row.get(0)?;
            let status_str: String = row.get(1)?;
            Ok((day_str, status_str))
        },
    )?;

    let mut days = vec![];
    for row in rows {
        let (day_str, status_str) = row?;
        let day = NaiveDate::parse_from_str(&day_str, DATE_FMT)
            .map_err(|_| anyhow::anyhow!("bad date stored in room_days: {day_str}"))?;
        days.push((day, AvailabilityStatus::parse(&status_str)));
    }
    Ok(days)
}

// ── Reservations ──

pub fn create_reservation(conn: &Connection, reservation: &Reservation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reservations
           (id, room_id, room_snapshot, check_in, check_out, guests, nights,
            subtotal, taxes, total, status, payment_status, payment_ref, customer,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            reservation.id,
            reservation.room.room_id,
            serde_json::to_string(&reservation.room)?,
            reservation.check_in.format(DATE_FMT).to_string(),
            reservation.check_out.format(DATE_FMT).to_string(),
            reservation.guests as i64,
            reservation.nights,
            reservation.subtotal,
            reservation.taxes,
            reservation.total,
            reservation.status.as_str(),
            reservation.payment_status.as_str(),
            reservation.payment_ref,
            serde_json::to_string(&reservation.customer)?,
            reservation.created_at.format(DATETIME_FMT).to_string(),
            reservation.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

const RESERVATION_COLS: &str = "id, room_snapshot, check_in, check_out, guests, nights, \
     subtotal, taxes, total, status, payment_status, payment_ref, customer, created_at, updated_at";

pub fn get_reservation(conn: &Connection, id: &str) -> anyhow::Result<Option<Reservation>> {
    let sql = format!("SELECT {RESERVATION_COLS} FROM reservations WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_reservation_row(row)));

    match result {
        Ok(reservation) => Ok(Some(reservation?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_reservations(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Reservation>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {RESERVATION_COLS} FROM reservations WHERE status = ?1
                 ORDER BY created_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {RESERVATION_COLS} FROM reservations ORDER BY created_at DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn update_reservation_status(
    conn: &Connection,
    id: &str,
    status: &ReservationStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE reservations SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn update_payment_status(
    conn: &Connection,
    id: &str,
    payment_status: &PaymentStatus,
    payment_ref: Option<&str>,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = match payment_ref {
        Some(pref) => conn.execute(
            "UPDATE reservations SET payment_status = ?1, payment_ref = ?2, updated_at = ?3 WHERE id = ?4",
            params![payment_status.as_str(), pref, now, id],
        )?,
        None => conn.execute(
            "UPDATE reservations SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![payment_status.as_str(), now, id],
        )?,
    };
    Ok(count > 0)
}

fn parse_reservation_row(row: &rusqlite::Row) -> anyhow::Result<Reservation> {
    let id: String = row.get(0)?;
    let room_json: String = row.get(1)?;
    let check_in_str: String = row.get(2)?;
    let check_out_str: String = row.get(3)?;
    let guests: i64 = row.get(4)?;
    let nights: i64 = row.get(5)?;
    let subtotal: i64 = row.get(6)?;
    let taxes: i64 = row.get(7)?;
    let total: i64 = row.get(8)?;
    let status_str: String = row.get(9)?;
    let payment_status_str: String = row.get(10)?;
    let payment_ref: Option<String> = row.get(11)?;
    let customer_json: String = row.get(12)?;
    let created_at_str: String = row.get(13)?;
    let updated_at_str: String = row.get(14)?;

    let room: RoomOption = serde_json::from_str(&room_json)?;
    let customer: CustomerInfo = serde_json::from_str(&customer_json)?;

    let check_in = NaiveDate::parse_from_str(&check_in_str, DATE_FMT)
        .map_err(|_| anyhow::anyhow!("bad check_in stored: {check_in_str}"))?;
    let check_out = NaiveDate::parse_from_str(&check_out_str, DATE_FMT)
        .map_err(|_| anyhow::anyhow!("bad check_out stored: {check_out_str}"))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Reservation {
        id,
        room,
        check_in,
        check_out,
        guests: guests as u32,
        nights,
        subtotal,
        taxes,
        total,
        status: ReservationStatus::parse(&status_str),
        payment_status: PaymentStatus::parse(&payment_status_str),
        payment_ref,
        customer,
        created_at,
        updated_at,
    })
}

// ── Flow sessions ──

#[derive(Serialize, Deserialize, Default)]
struct SessionData {
    request: Option<BookingRequest>,
    room: Option<RoomOption>,
    customer: Option<CustomerInfo>,
    reference: Option<String>,
    failure: Option<String>,
}

pub fn get_flow_session(conn: &Connection, id: &str) -> anyhow::Result<Option<FlowSession>> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let result = conn.query_row(
        "SELECT id, step, data, last_activity, expires_at FROM flow_sessions
         WHERE id = ?1 AND expires_at > ?2",
        params![id, now],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );

    match result {
        Ok((id, step_str, data_json, last_activity_str, expires_at_str)) => {
            let data: SessionData = serde_json::from_str(&data_json).unwrap_or_default();
            let last_activity = NaiveDateTime::parse_from_str(&last_activity_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());
            let expires_at = NaiveDateTime::parse_from_str(&expires_at_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());

            Ok(Some(FlowSession {
                id,
                step: FlowStep::parse(&step_str),
                request: data.request,
                room: data.room,
                customer: data.customer,
                reference: data.reference,
                failure: data.failure,
                last_activity,
                expires_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_flow_session(conn: &Connection, session: &FlowSession) -> anyhow::Result<()> {
    let data = SessionData {
        request: session.request.clone(),
        room: session.room.clone(),
        customer: session.customer.clone(),
        reference: session.reference.clone(),
        failure: session.failure.clone(),
    };
    let data_json = serde_json::to_string(&data)?;
    let last_activity = session.last_activity.format(DATETIME_FMT).to_string();
    let expires_at = session.expires_at.format(DATETIME_FMT).to_string();

    conn.execute(
        "INSERT INTO flow_sessions (id, step, data, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
           step = excluded.step,
           data = excluded.data,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![session.id, session.step.as_str(), data_json, last_activity, expires_at],
    )?;
    Ok(())
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "DELETE FROM flow_sessions WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}

// ── Reservation events ──

pub fn insert_reservation_event(
    conn: &Connection,
    reservation_id: &str,
    kind: &str,
    detail: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO reservation_events (reservation_id, kind, detail) VALUES (?1, ?2, ?3)",
        params![reservation_id, kind, detail],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_events_since(conn: &Connection, last_id: i64) -> anyhow::Result<Vec<ReservationEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, reservation_id, kind, detail, created_at FROM reservation_events
         WHERE id > ?1 ORDER BY id ASC LIMIT 200",
    )?;
    let rows = stmt.query_map(params![last_id], |row| {
        Ok(ReservationEvent {
            id: row.get(0)?,
            reservation_id: row.get(1)?,
            kind: row.get(2)?,
            detail: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

// ── Dashboard ──

pub struct DashboardStats {
    pub rooms_count: i64,
    pub pending_count: i64,
    pub confirmed_count: i64,
    pub upcoming_arrivals: i64,
}

pub fn get_dashboard_stats(conn: &Connection, today: NaiveDate) -> anyhow::Result<DashboardStats> {
    let today_str = today.format(DATE_FMT).to_string();

    let rooms_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))
        .unwrap_or(0);

    let pending_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'pending'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let confirmed_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE status = 'confirmed'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let upcoming_arrivals: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM reservations WHERE check_in >= ?1 AND status != 'cancelled'",
            params![today_str],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        rooms_count,
        pending_count,
        confirmed_count,
        upcoming_arrivals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FMT).unwrap()
    }

    fn sample_room() -> Room {
        Room {
            id: "T-1".to_string(),
            name: "Test Room".to_string(),
            category: RoomCategory::Familiale,
            price_per_night: 260,
            capacity: 4,
            description: Some("two connecting rooms".to_string()),
        }
    }

    fn sample_reservation(id: &str) -> Reservation {
        let now = Utc::now().naive_utc();
        Reservation {
            id: id.to_string(),
            room: RoomOption::from_room(&sample_room(), AvailabilityStatus::Available),
            check_in: date("2025-10-04"),
            check_out: date("2025-10-07"),
            guests: 2,
            nights: 3,
            subtotal: 780,
            taxes: 78,
            total: 858,
            status: ReservationStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_ref: None,
            customer: CustomerInfo {
                first_name: "Amira".to_string(),
                last_name: "Ben Salah".to_string(),
                email: "amira@example.com".to_string(),
                phone: "+216 20 123 456".to_string(),
                special_requests: None,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_room_crud_round_trip() {
        let conn = setup_db();
        let mut room = sample_room();
        create_room(&conn, &room).unwrap();

        let loaded = get_room(&conn, "T-1").unwrap().unwrap();
        assert_eq!(loaded.name, "Test Room");
        assert_eq!(loaded.category, RoomCategory::Familiale);
        assert_eq!(loaded.capacity, 4);

        room.price_per_night = 300;
        assert!(update_room(&conn, &room).unwrap());
        assert_eq!(get_room(&conn, "T-1").unwrap().unwrap().price_per_night, 300);

        assert!(delete_room(&conn, "T-1").unwrap());
        assert!(get_room(&conn, "T-1").unwrap().is_none());
        assert!(!delete_room(&conn, "T-1").unwrap());
    }

    #[test]
    fn test_room_days_set_and_clear() {
        let conn = setup_db();
        create_room(&conn, &sample_room()).unwrap();

        set_room_days(&conn, "T-1", date("2025-10-04"), date("2025-10-07"), AvailabilityStatus::Occupied).unwrap();
        let days = get_unavailable_days(&conn, "T-1", date("2025-10-01"), date("2025-10-31")).unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], (date("2025-10-04"), AvailabilityStatus::Occupied));

        // Setting back to available clears the rows
        set_room_days(&conn, "T-1", date("2025-10-04"), date("2025-10-07"), AvailabilityStatus::Available).unwrap();
        let days = get_unavailable_days(&conn, "T-1", date("2025-10-01"), date("2025-10-31")).unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn test_reservation_round_trip() {
        let conn = setup_db();
        create_reservation(&conn, &sample_reservation("DDK-1")).unwrap();

        let loaded = get_reservation(&conn, "DDK-1").unwrap().unwrap();
        assert_eq!(loaded.room.room_id, "T-1");
        assert_eq!(loaded.customer.first_name, "Amira");
        assert_eq!(loaded.total, loaded.subtotal + loaded.taxes);
        assert_eq!(loaded.status, ReservationStatus::Pending);

        assert!(get_reservation(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_reservation_id_rejected() {
        let conn = setup_db();
        create_reservation(&conn, &sample_reservation("DDK-1")).unwrap();
        assert!(create_reservation(&conn, &sample_reservation("DDK-1")).is_err());
    }

    #[test]
    fn test_reservation_status_updates() {
        let conn = setup_db();
        create_reservation(&conn, &sample_reservation("DDK-1")).unwrap();

        assert!(update_reservation_status(&conn, "DDK-1", &ReservationStatus::Confirmed).unwrap());
        assert!(update_payment_status(&conn, "DDK-1", &PaymentStatus::Paid, Some("PAY-9")).unwrap());

        let loaded = get_reservation(&conn, "DDK-1").unwrap().unwrap();
        assert_eq!(loaded.status, ReservationStatus::Confirmed);
        assert_eq!(loaded.payment_status, PaymentStatus::Paid);
        assert_eq!(loaded.payment_ref.as_deref(), Some("PAY-9"));

        assert!(!update_reservation_status(&conn, "nope", &ReservationStatus::Cancelled).unwrap());
    }

    #[test]
    fn test_list_reservations_filter_and_limit() {
        let conn = setup_db();
        create_reservation(&conn, &sample_reservation("DDK-1")).unwrap();
        create_reservation(&conn, &sample_reservation("DDK-2")).unwrap();
        update_reservation_status(&conn, "DDK-2", &ReservationStatus::Cancelled).unwrap();

        assert_eq!(list_reservations(&conn, None, 50).unwrap().len(), 2);
        assert_eq!(list_reservations(&conn, Some("cancelled"), 50).unwrap().len(), 1);
        assert_eq!(list_reservations(&conn, None, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_flow_session_round_trip() {
        let conn = setup_db();
        let now = Utc::now().naive_utc();
        let mut session = FlowSession::new("sess-1".to_string(), now);
        session.step = FlowStep::Rooms;
        session.request = Some(BookingRequest {
            check_in: date("2025-10-04"),
            check_out: date("2025-10-07"),
            guests: 2,
        });

        save_flow_session(&conn, &session).unwrap();
        let loaded = get_flow_session(&conn, "sess-1").unwrap().unwrap();
        assert_eq!(loaded.step, FlowStep::Rooms);
        assert_eq!(loaded.request.unwrap().guests, 2);
        assert!(loaded.room.is_none());

        assert!(get_flow_session(&conn, "other").unwrap().is_none());
    }

    #[test]
    fn test_expired_session_is_invisible() {
        let conn = setup_db();
        let past = Utc::now().naive_utc() - Duration::hours(3);
        let session = FlowSession::new("sess-old".to_string(), past);

        save_flow_session(&conn, &session).unwrap();
        assert!(get_flow_session(&conn, "sess-old").unwrap().is_none());
        assert_eq!(expire_old_sessions(&conn).unwrap(), 1);
    }

    #[test]
    fn test_events_catchup() {
        let conn = setup_db();
        let a = insert_reservation_event(&conn, "DDK-1", "created", "new booking").unwrap();
        let b = insert_reservation_event(&conn, "DDK-1", "paid", "payment completed").unwrap();
        assert!(b > a);

        let events = get_events_since(&conn, a).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "paid");
    }

    #[test]
    fn test_dashboard_stats() {
        let conn = setup_db();
        create_reservation(&conn, &sample_reservation("DDK-1")).unwrap();

        let stats = get_dashboard_stats(&conn, date("2025-10-01")).unwrap();
        assert!(stats.rooms_count >= 6); // seeded catalog
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.confirmed_count, 0);
        assert_eq!(stats.upcoming_arrivals, 1);
    }
}
