mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod errors;

use std::net::SocketAddr;
use axum::{Router, routing::get, response::Html};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;
use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::calculator_routes::api_routes;
use crate::services::advisory::GeminiClient;
use crate::shared_state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Load configuration
    let config_path = std::env::var("SOLAR_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", config_path, e);
            return;
        }
    };
    tracing::info!(
        "Configuration loaded: {} panel types, {} regions, {} subsidy tiers",
        config.policy.panels.len(),
        config.policy.regions.len(),
        config.policy.central_subsidy_tiers.len()
    );

    // 2. Advisory backend
    let advisor = match GeminiClient::from_env(config.advisory.clone()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to build advisory client: {}", e);
            return;
        }
    };
    if advisor.is_ready() {
        tracing::info!("[ADVISORY] Using model {}", config.advisory.model);
    } else {
        tracing::warn!("[ADVISORY] Disabled or {} not set, static advice only", config.advisory.api_key_env);
    }

    // 3. Shared state
    let shared = SharedState {
        app: AppState::new(),
        config: config.clone(),
        advisor,
    };

    // 4. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(shared))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("API Server listening on http://{}", addr);
    tracing::info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        tracing::error!("Server error: {}", e);
    }
}
