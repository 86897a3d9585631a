use std::sync::Arc;

use rugby_coach_backend::api::{self, AppState};
use rugby_coach_backend::config::Config;
use rugby_coach_backend::llm::OpenAiClient;
use rugby_coach_backend::metrics;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::load();
    metrics::register_metrics();

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; every analysis will use fallback data");
    }

    let provider = match OpenAiClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to build completion client: {e}");
            std::process::exit(1);
        }
    };

    let port = config.port;
    tracing::info!(
        "Allowing CORS origin {} and using model {}",
        config.frontend_url,
        config.openai_model
    );
    let app = api::router(AppState::new(config, provider));

    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to port {port}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Rugby coach backend listening on port {port}");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}
