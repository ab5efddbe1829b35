use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use frontdesk::config::AppConfig;
use frontdesk::handlers;
use frontdesk::services::calendar::http::HttpCalendarProvider;
use frontdesk::services::sessions::SessionStore;
use frontdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    tracing::info!(
        business = %config.business_name,
        calendar_url = %config.calendar_url,
        "starting receptionist"
    );

    let calendar = HttpCalendarProvider::new(config.calendar_url.clone());
    let sessions = SessionStore::new(config.session_timeout_minutes);

    let state = Arc::new(AppState {
        config: config.clone(),
        calendar: Box::new(calendar),
        sessions,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .route("/chat/confirm-booking", post(handlers::chat::confirm_booking))
        .route("/chat/session/:id", get(handlers::chat::session_info))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
