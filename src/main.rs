use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use clinicdesk::config::AppConfig;
use clinicdesk::db;
use clinicdesk::handlers;
use clinicdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/slots", get(handlers::availability::get_slots))
        .route("/api/packages", get(handlers::availability::get_packages))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/availability/day",
            get(handlers::availability::get_day_availability),
        )
        .route("/api/requests", post(handlers::requests::create_request))
        .route("/api/requests/:id", get(handlers::requests::get_request))
        .route("/api/requests/:id", put(handlers::requests::update_request))
        .route(
            "/api/requests/:id",
            delete(handlers::requests::delete_request),
        )
        .route(
            "/api/appointments/:id/edit-requests",
            post(handlers::edits::create_edit_request),
        )
        .route(
            "/api/appointments/:id/edit-requests/pending-map",
            get(handlers::edits::get_pending_map),
        )
        .route("/api/admin/requests", get(handlers::admin::get_requests))
        .route(
            "/api/admin/requests/:id/approve",
            post(handlers::admin::approve_request),
        )
        .route(
            "/api/admin/requests/:id/reject",
            post(handlers::admin::reject_request),
        )
        .route(
            "/api/admin/edit-requests/:id/approve",
            post(handlers::admin::approve_edit_request),
        )
        .route(
            "/api/admin/edit-requests/:id/reject",
            post(handlers::admin::reject_edit_request),
        )
        .route(
            "/api/admin/therapists",
            get(handlers::admin::get_therapists),
        )
        .route(
            "/api/admin/therapists",
            post(handlers::admin::create_therapist),
        )
        .route(
            "/api/admin/therapists/:id/holidays",
            post(handlers::admin::add_holiday),
        )
        .route(
            "/api/admin/capacity/defaults",
            post(handlers::admin::apply_capacity_defaults),
        )
        .route("/api/admin/capacity", put(handlers::admin::set_capacity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
