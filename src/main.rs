use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dar_dhiafa::config::AppConfig;
use dar_dhiafa::db;
use dar_dhiafa::handlers;
use dar_dhiafa::services::payment::konnect::KonnectProvider;
use dar_dhiafa::services::payment::simulated::SimulatedProvider;
use dar_dhiafa::services::payment::PaymentProvider;
use dar_dhiafa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let payment: Box<dyn PaymentProvider> = match config.payment_provider.as_str() {
        "konnect" => {
            anyhow::ensure!(
                !config.konnect_api_key.is_empty(),
                "KONNECT_API_KEY must be set when PAYMENT_PROVIDER=konnect"
            );
            tracing::info!("using Konnect payment provider (wallet: {})", config.konnect_wallet_id);
            Box::new(KonnectProvider::new(
                config.konnect_api_key.clone(),
                config.konnect_wallet_id.clone(),
                config.konnect_base_url.clone(),
                config.currency.clone(),
            ))
        }
        _ => {
            tracing::info!("using simulated payment provider");
            Box::new(SimulatedProvider::new(20))
        }
    };

    let (events_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payment,
        events_tx,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/rooms", get(handlers::rooms::list_rooms))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/flow", post(handlers::flow::start_flow))
        .route("/api/flow/:id", get(handlers::flow::get_flow))
        .route("/api/flow/:id/search", post(handlers::flow::submit_search))
        .route("/api/flow/:id/rooms", get(handlers::flow::list_rooms))
        .route("/api/flow/:id/select", post(handlers::flow::select_room))
        .route("/api/flow/:id/customer", post(handlers::flow::submit_customer))
        .route("/api/flow/:id/confirm", post(handlers::flow::confirm))
        .route("/api/flow/:id/back", post(handlers::flow::go_back))
        .route("/api/flow/:id/reset", post(handlers::flow::reset))
        .route("/webhook/payment", post(handlers::webhook::payment_webhook))
        .route("/api/admin/status", get(handlers::admin::get_status))
        .route(
            "/api/admin/reservations",
            get(handlers::admin::get_reservations),
        )
        .route(
            "/api/admin/reservations/:id/confirm",
            post(handlers::admin::confirm_reservation),
        )
        .route(
            "/api/admin/reservations/:id/cancel",
            post(handlers::admin::cancel_reservation),
        )
        .route("/api/admin/rooms", get(handlers::admin::get_rooms))
        .route("/api/admin/rooms", post(handlers::admin::create_room))
        .route("/api/admin/rooms/:id", post(handlers::admin::update_room))
        .route(
            "/api/admin/rooms/:id/delete",
            post(handlers::admin::delete_room),
        )
        .route("/api/admin/rooms/:id/days", get(handlers::admin::get_room_days))
        .route("/api/admin/rooms/:id/days", post(handlers::admin::set_room_days))
        .route("/api/admin/events", get(handlers::admin::events_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
