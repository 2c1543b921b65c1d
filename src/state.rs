use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::ReservationEvent;
use crate::services::payment::PaymentProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub payment: Box<dyn PaymentProvider>,
    pub events_tx: broadcast::Sender<ReservationEvent>,
}
