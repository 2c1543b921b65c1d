use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::FieldError;
use crate::models::{
    new_reference, AvailabilityStatus, BookingRequest, CustomerInfo, FlowSession, FlowStep,
    PaymentStatus, Reservation, ReservationStatus, RoomOption,
};
use crate::services::payment::PaymentProvider;
use crate::services::pricing::{self, Quote};

/// Seam between the flow controller and persistence: the controller only
/// ever needs `create`, so tests can swap in an in-memory fake and force
/// both submission outcomes deterministically.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn create(&self, reservation: &Reservation) -> anyhow::Result<()>;
}

pub struct SqliteReservationStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteReservationStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReservationStore for SqliteReservationStore {
    async fn create(&self, reservation: &Reservation) -> anyhow::Result<()> {
        let db = self.db.lock().unwrap();
        queries::create_reservation(&db, reservation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("{}", .0.message)]
    Validation(FieldError),

    #[error("this room is {} for the selected dates", .0.as_str())]
    RoomUnavailable(AvailabilityStatus),

    #[error("this room sleeps {capacity}, but the stay is for {guests} guests")]
    OverCapacity { capacity: u32, guests: u32 },

    #[error("cannot {action} from the {} step", step.as_str())]
    WrongStep { action: &'static str, step: FlowStep },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<FlowError> for crate::errors::AppError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(fe) => crate::errors::AppError::Validation(fe),
            FlowError::Internal(e) => crate::errors::AppError::Internal(e),
            other => crate::errors::AppError::Conflict(other.to_string()),
        }
    }
}

/// What a renderer may see at each step: exactly the data the step needs,
/// nothing from steps not yet reached. The Error step keeps the entered data
/// visible so a retry does not start from scratch.
#[derive(Debug, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepView {
    Search,
    Rooms {
        request: BookingRequest,
    },
    Customer {
        request: BookingRequest,
        room: RoomOption,
    },
    Summary {
        request: BookingRequest,
        room: RoomOption,
        customer: CustomerInfo,
        quote: Quote,
    },
    Success {
        reference: String,
        quote: Quote,
    },
    Error {
        reason: String,
        request: BookingRequest,
        room: RoomOption,
        customer: CustomerInfo,
    },
}

/// Outcome of a submission attempt. A failure is a flow state, not an
/// escaping error: the session lands on the Error step with its data intact.
#[derive(Debug)]
pub enum Submission {
    Completed {
        reservation: Reservation,
        pay_url: Option<String>,
    },
    Failed {
        reason: String,
    },
}

pub fn submit_search(
    session: &mut FlowSession,
    request: BookingRequest,
    today: NaiveDate,
) -> Result<(), FlowError> {
    if session.step != FlowStep::Search {
        return Err(FlowError::WrongStep {
            action: "submit a search",
            step: session.step,
        });
    }
    request.validate(today).map_err(FlowError::Validation)?;

    session.request = Some(request);
    session.step = FlowStep::Rooms;
    Ok(())
}

pub fn select_room(session: &mut FlowSession, option: RoomOption) -> Result<(), FlowError> {
    if session.step != FlowStep::Rooms {
        return Err(FlowError::WrongStep {
            action: "select a room",
            step: session.step,
        });
    }
    if option.status != AvailabilityStatus::Available {
        return Err(FlowError::RoomUnavailable(option.status));
    }
    let guests = session
        .request
        .as_ref()
        .map(|r| r.guests)
        .ok_or_else(|| anyhow::anyhow!("rooms step reached without a booking request"))?;
    if option.capacity < guests {
        return Err(FlowError::OverCapacity {
            capacity: option.capacity,
            guests,
        });
    }

    session.room = Some(option);
    session.step = FlowStep::Customer;
    Ok(())
}

pub fn submit_customer(session: &mut FlowSession, customer: CustomerInfo) -> Result<(), FlowError> {
    if session.step != FlowStep::Customer {
        return Err(FlowError::WrongStep {
            action: "submit customer details",
            step: session.step,
        });
    }
    customer.validate().map_err(FlowError::Validation)?;

    session.customer = Some(customer);
    session.step = FlowStep::Summary;
    Ok(())
}

pub fn go_back(session: &mut FlowSession) -> Result<(), FlowError> {
    // Step pointer only; held data survives so re-advancing is cheap
    session.step = match session.step {
        FlowStep::Rooms => FlowStep::Search,
        FlowStep::Customer => FlowStep::Rooms,
        FlowStep::Summary => FlowStep::Customer,
        step => {
            return Err(FlowError::WrongStep {
                action: "go back",
                step,
            })
        }
    };
    Ok(())
}

/// The "new booking" action: returns to a blank Search from any step.
pub fn reset(session: &mut FlowSession) {
    session.step = FlowStep::Search;
    session.request = None;
    session.room = None;
    session.customer = None;
    session.reference = None;
    session.failure = None;
}

/// Submits the booking. Allowed from Summary, and from Error as a retry that
/// reuses the already-generated reference so a double confirm or a retry
/// cannot create a second reservation.
pub async fn confirm(
    session: &mut FlowSession,
    store: &dyn ReservationStore,
    payment: &dyn PaymentProvider,
    now: NaiveDateTime,
) -> Result<Submission, FlowError> {
    if session.step != FlowStep::Summary && session.step != FlowStep::Error {
        return Err(FlowError::WrongStep {
            action: "confirm the booking",
            step: session.step,
        });
    }

    let (request, room, customer, quote) = held_booking(session)?;

    let reference = session
        .reference
        .get_or_insert_with(|| new_reference(now))
        .clone();

    let mut reservation = Reservation {
        id: reference,
        room,
        check_in: request.check_in,
        check_out: request.check_out,
        guests: request.guests,
        nights: quote.nights,
        subtotal: quote.subtotal,
        taxes: quote.taxes,
        total: quote.total,
        status: ReservationStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_ref: None,
        customer,
        created_at: now,
        updated_at: now,
    };

    let init = match payment.initiate(&reservation).await {
        Ok(init) => init,
        Err(e) => return Ok(fail(session, format!("payment could not be started: {e}"))),
    };
    reservation.payment_ref = Some(init.payment_ref);

    if let Err(e) = store.create(&reservation).await {
        return Ok(fail(session, format!("booking could not be saved: {e}")));
    }

    tracing::info!(
        reservation = %reservation.id,
        total = reservation.total,
        "booking submitted"
    );

    session.step = FlowStep::Success;
    session.failure = None;
    Ok(Submission::Completed {
        reservation,
        pay_url: init.pay_url,
    })
}

fn fail(session: &mut FlowSession, reason: String) -> Submission {
    tracing::warn!(session = %session.id, reason = %reason, "booking submission failed");
    session.step = FlowStep::Error;
    session.failure = Some(reason.clone());
    Submission::Failed { reason }
}

/// Projects the session into what the current step may render.
pub fn view(session: &FlowSession) -> anyhow::Result<StepView> {
    Ok(match session.step {
        FlowStep::Search => StepView::Search,
        FlowStep::Rooms => StepView::Rooms {
            request: held(&session.request, "rooms", "request")?,
        },
        FlowStep::Customer => StepView::Customer {
            request: held(&session.request, "customer", "request")?,
            room: held(&session.room, "customer", "room")?,
        },
        FlowStep::Summary => {
            let (request, room, customer, quote) = held_booking(session)?;
            StepView::Summary {
                request,
                room,
                customer,
                quote,
            }
        }
        FlowStep::Success => {
            let (_, _, _, quote) = held_booking(session)?;
            StepView::Success {
                reference: held(&session.reference, "success", "reference")?,
                quote,
            }
        }
        FlowStep::Error => StepView::Error {
            reason: session
                .failure
                .clone()
                .unwrap_or_else(|| "booking submission failed".to_string()),
            request: held(&session.request, "error", "request")?,
            room: held(&session.room, "error", "room")?,
            customer: held(&session.customer, "error", "customer")?,
        },
    })
}

fn held<T: Clone>(value: &Option<T>, step: &str, what: &str) -> anyhow::Result<T> {
    value
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{step} step reached without a stored {what}"))
}

fn held_booking(
    session: &FlowSession,
) -> anyhow::Result<(BookingRequest, RoomOption, CustomerInfo, Quote)> {
    let request = held(&session.request, session.step.as_str(), "request")?;
    let room = held(&session.room, session.step.as_str(), "room")?;
    let customer = held(&session.customer, session.step.as_str(), "customer")?;
    let quote = pricing::quote(request.check_in, request.check_out, room.price_per_night)?;
    Ok((request, room, customer, quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomCategory;
    use crate::services::payment::PaymentInit;

    struct MemoryStore {
        created: Mutex<Vec<Reservation>>,
        fail: bool,
    }

    impl MemoryStore {
        fn new(fail: bool) -> Self {
            Self {
                created: Mutex::new(vec![]),
                fail,
            }
        }
    }

    #[async_trait]
    impl ReservationStore for MemoryStore {
        async fn create(&self, reservation: &Reservation) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("storage offline");
            }
            self.created.lock().unwrap().push(reservation.clone());
            Ok(())
        }
    }

    struct OkPayment;

    #[async_trait]
    impl PaymentProvider for OkPayment {
        async fn initiate(&self, reservation: &Reservation) -> anyhow::Result<PaymentInit> {
            Ok(PaymentInit {
                payment_ref: format!("PAY-{}", reservation.id),
                pay_url: Some("https://pay.example/x".to_string()),
            })
        }
    }

    struct DecliningPayment;

    #[async_trait]
    impl PaymentProvider for DecliningPayment {
        async fn initiate(&self, _reservation: &Reservation) -> anyhow::Result<PaymentInit> {
            anyhow::bail!("card declined")
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-10-01 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn new_session() -> FlowSession {
        FlowSession::new("sess-1".to_string(), now())
    }

    fn request() -> BookingRequest {
        BookingRequest {
            check_in: date("2025-10-04"),
            check_out: date("2025-10-07"),
            guests: 2,
        }
    }

    fn available_room() -> RoomOption {
        RoomOption {
            room_id: "DBL-01".to_string(),
            name: "Chambre Double Jasmin".to_string(),
            category: RoomCategory::Double,
            price_per_night: 200,
            capacity: 2,
            status: AvailabilityStatus::Available,
        }
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            first_name: "Amira".to_string(),
            last_name: "Ben Salah".to_string(),
            email: "amira@example.com".to_string(),
            phone: "+216 20 123 456".to_string(),
            special_requests: Some("late arrival".to_string()),
        }
    }

    fn session_at_summary() -> FlowSession {
        let mut s = new_session();
        submit_search(&mut s, request(), date("2025-10-01")).unwrap();
        select_room(&mut s, available_room()).unwrap();
        submit_customer(&mut s, customer()).unwrap();
        s
    }

    #[tokio::test]
    async fn test_happy_path() {
        let mut s = session_at_summary();
        assert_eq!(s.step, FlowStep::Summary);

        let store = MemoryStore::new(false);
        match confirm(&mut s, &store, &OkPayment, now()).await.unwrap() {
            Submission::Completed { reservation, pay_url } => {
                assert_eq!(reservation.nights, 3);
                assert_eq!(reservation.subtotal, 600);
                assert_eq!(reservation.taxes, 60);
                assert_eq!(reservation.total, 660);
                assert_eq!(reservation.status, ReservationStatus::Pending);
                assert_eq!(reservation.payment_status, PaymentStatus::Pending);
                assert!(reservation.id.starts_with("DDK-"));
                assert!(pay_url.is_some());
            }
            Submission::Failed { reason } => panic!("unexpected failure: {reason}"),
        }
        assert_eq!(s.step, FlowStep::Success);
        assert_eq!(store.created.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_search_rejects_invalid_request() {
        let mut s = new_session();
        let bad = BookingRequest {
            check_in: date("2025-10-04"),
            check_out: date("2025-10-04"),
            guests: 2,
        };
        let err = submit_search(&mut s, bad, date("2025-10-01")).unwrap_err();
        assert!(matches!(err, FlowError::Validation(ref fe) if fe.field == "check_out"));
        assert_eq!(s.step, FlowStep::Search);
        assert!(s.request.is_none());
    }

    #[test]
    fn test_occupied_room_is_not_selectable() {
        let mut s = new_session();
        submit_search(&mut s, request(), date("2025-10-01")).unwrap();

        let mut room = available_room();
        room.status = AvailabilityStatus::Occupied;
        let err = select_room(&mut s, room).unwrap_err();
        assert!(matches!(err, FlowError::RoomUnavailable(AvailabilityStatus::Occupied)));
        assert_eq!(s.step, FlowStep::Rooms);
        assert!(s.room.is_none());
    }

    #[test]
    fn test_room_capacity_guard() {
        let mut s = new_session();
        let mut req = request();
        req.guests = 4;
        submit_search(&mut s, req, date("2025-10-01")).unwrap();

        let err = select_room(&mut s, available_room()).unwrap_err();
        assert!(matches!(err, FlowError::OverCapacity { capacity: 2, guests: 4 }));
        assert_eq!(s.step, FlowStep::Rooms);
    }

    #[test]
    fn test_invalid_email_keeps_customer_step() {
        let mut s = new_session();
        submit_search(&mut s, request(), date("2025-10-01")).unwrap();
        select_room(&mut s, available_room()).unwrap();

        let mut c = customer();
        c.email = "not-an-email".to_string();
        let err = submit_customer(&mut s, c).unwrap_err();
        assert!(matches!(err, FlowError::Validation(ref fe) if fe.field == "email"));
        assert_eq!(s.step, FlowStep::Customer);
        assert!(s.customer.is_none());
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut s = new_session();
        assert!(matches!(
            select_room(&mut s, available_room()),
            Err(FlowError::WrongStep { .. })
        ));
        assert!(matches!(
            submit_customer(&mut s, customer()),
            Err(FlowError::WrongStep { .. })
        ));

        submit_search(&mut s, request(), date("2025-10-01")).unwrap();
        assert!(matches!(
            submit_customer(&mut s, customer()),
            Err(FlowError::WrongStep { .. })
        ));
    }

    #[tokio::test]
    async fn test_confirm_requires_summary() {
        let mut s = new_session();
        let store = MemoryStore::new(false);
        let err = confirm(&mut s, &store, &OkPayment, now()).await.unwrap_err();
        assert!(matches!(err, FlowError::WrongStep { .. }));
    }

    #[test]
    fn test_back_walks_one_step() {
        let mut s = session_at_summary();
        go_back(&mut s).unwrap();
        assert_eq!(s.step, FlowStep::Customer);
        go_back(&mut s).unwrap();
        assert_eq!(s.step, FlowStep::Rooms);
        go_back(&mut s).unwrap();
        assert_eq!(s.step, FlowStep::Search);
        assert!(go_back(&mut s).is_err());

        // Held data survived; only the step pointer moved
        assert!(s.request.is_some());
        assert!(s.room.is_some());
        assert!(s.customer.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_lands_on_error_keeping_data() {
        let mut s = session_at_summary();
        let store = MemoryStore::new(true);

        match confirm(&mut s, &store, &OkPayment, now()).await.unwrap() {
            Submission::Failed { reason } => assert!(reason.contains("storage offline")),
            Submission::Completed { .. } => panic!("expected failure"),
        }

        assert_eq!(s.step, FlowStep::Error);
        assert!(s.request.is_some());
        assert!(s.room.is_some());
        assert!(s.customer.is_some());
        assert!(s.reference.is_some());
    }

    #[tokio::test]
    async fn test_payment_failure_lands_on_error() {
        let mut s = session_at_summary();
        let store = MemoryStore::new(false);

        match confirm(&mut s, &store, &DecliningPayment, now()).await.unwrap() {
            Submission::Failed { reason } => assert!(reason.contains("card declined")),
            Submission::Completed { .. } => panic!("expected failure"),
        }
        assert_eq!(s.step, FlowStep::Error);
        // Nothing was persisted
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_reuses_reference_and_succeeds() {
        let mut s = session_at_summary();

        let failing = MemoryStore::new(true);
        let _ = confirm(&mut s, &failing, &OkPayment, now()).await.unwrap();
        let reference = s.reference.clone().unwrap();
        assert_eq!(s.step, FlowStep::Error);

        let working = MemoryStore::new(false);
        match confirm(&mut s, &working, &OkPayment, now()).await.unwrap() {
            Submission::Completed { reservation, .. } => {
                assert_eq!(reservation.id, reference);
            }
            Submission::Failed { reason } => panic!("retry failed: {reason}"),
        }
        assert_eq!(s.step, FlowStep::Success);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let mut s = session_at_summary();
        let store = MemoryStore::new(false);
        let _ = confirm(&mut s, &store, &OkPayment, now()).await.unwrap();
        assert_eq!(s.step, FlowStep::Success);

        reset(&mut s);
        assert_eq!(s.step, FlowStep::Search);
        assert!(s.request.is_none());
        assert!(s.room.is_none());
        assert!(s.customer.is_none());
        assert!(s.reference.is_none());
        assert!(s.failure.is_none());
    }

    #[test]
    fn test_view_exposes_only_reached_data() {
        let mut s = new_session();
        assert!(matches!(view(&s).unwrap(), StepView::Search));

        submit_search(&mut s, request(), date("2025-10-01")).unwrap();
        assert!(matches!(view(&s).unwrap(), StepView::Rooms { .. }));

        select_room(&mut s, available_room()).unwrap();
        assert!(matches!(view(&s).unwrap(), StepView::Customer { .. }));

        submit_customer(&mut s, customer()).unwrap();
        match view(&s).unwrap() {
            StepView::Summary { quote, .. } => {
                assert_eq!(quote.total, 660);
            }
            other => panic!("expected summary view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_view_keeps_entered_data_inspectable() {
        let mut s = session_at_summary();
        let _ = confirm(&mut s, &MemoryStore::new(true), &OkPayment, now())
            .await
            .unwrap();

        match view(&s).unwrap() {
            StepView::Error { reason, request, room, customer } => {
                assert!(reason.contains("storage offline"));
                assert_eq!(request.guests, 2);
                assert_eq!(room.room_id, "DBL-01");
                assert_eq!(customer.first_name, "Amira");
            }
            other => panic!("expected error view, got {other:?}"),
        }
    }
}
