pub mod customer;
pub mod event;
pub mod flow;
pub mod request;
pub mod reservation;
pub mod room;

pub use customer::CustomerInfo;
pub use event::ReservationEvent;
pub use flow::{FlowSession, FlowStep, SESSION_TTL_MINUTES};
pub use request::{BookingRequest, MAX_GUESTS, MIN_GUESTS};
pub use reservation::{new_reference, PaymentStatus, Reservation, ReservationStatus};
pub use room::{AvailabilityStatus, Room, RoomCategory, RoomOption};
