mod errors;
mod models;
mod routes;
mod service;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::routes::relay_routes::chat_stream_handler;
use crate::service::relay_service::RelayService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dify_stream_chat=debug,tower_http=debug".into()),
        )
        .init();

    // ── Upstream configuration ────────────────────────────────────────────────
    let api_url = std::env::var("DIFY_API_URL")
        .unwrap_or_else(|_| "https://api.dify.ai/v1".to_string());
    let api_key = std::env::var("DIFY_API_KEY").ok().filter(|k| !k.is_empty());
    let user = std::env::var("DIFY_USER_ID").unwrap_or_else(|_| "demo-user".to_string());

    if api_key.is_none() {
        warn!("DIFY_API_KEY is not set; /api/chat will answer 500 until it is configured");
    }

    let relay = RelayService::new(reqwest::Client::new(), api_url, api_key, user);

    // ── Router ────────────────────────────────────────────────────────────────
    let app = Router::new()
        .route("/api/chat", get(chat_stream_handler))
        .layer(TraceLayer::new_for_http())
        // The frontend is served separately (trunk dev server), so the relay
        // must answer cross-origin requests.
        .layer(CorsLayer::permissive())
        .with_state(relay);

    // ── Listen ────────────────────────────────────────────────────────────────
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
