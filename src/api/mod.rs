// HTTP API routes (health, CORS check, echo, player analysis, metrics).

pub mod players;

use axum::{
    extract::{rejection::JsonRejection, Json, MatchedPath, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::{Config, DEFAULT_FRONTEND_URL};
use crate::llm::CompletionProvider;
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn CompletionProvider>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

// ── Error helper ──────────────────────────────────────────────────────

pub fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

pub fn json_error_details(status: StatusCode, msg: &str, details: &str) -> Response {
    (status, Json(json!({ "error": msg, "details": details }))).into_response()
}

pub(crate) fn bad_json(rejection: JsonRejection) -> Response {
    tracing::debug!("Rejected request body: {rejection}");
    json_error_details(
        StatusCode::BAD_REQUEST,
        "Invalid JSON body",
        &rejection.body_text(),
    )
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let static_dir = state.config.static_dir.clone();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .route("/llms.txt", get(get_llms_txt))
        .route("/api/hello", get(hello))
        .route("/api/test-cors", get(test_cors))
        .route("/api/echo", post(echo))
        .route("/api/players", post(players::submit_player))
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(track_metrics)).layer(cors)
}

/// CORS policy: only the configured frontend origin, with credentials.
/// Preflight requests are answered by the layer itself.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = HeaderValue::from_str(&config.frontend_url).unwrap_or_else(|e| {
        tracing::warn!(
            "FRONTEND_URL {:?} is not a valid origin ({e}), using {DEFAULT_FRONTEND_URL}",
            config.frontend_url
        );
        HeaderValue::from_static(DEFAULT_FRONTEND_URL)
    });

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let started = Instant::now();
    let response = next.run(req).await;

    metrics::API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(started.elapsed().as_secs_f64());
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&[
            method.as_str(),
            endpoint.as_str(),
            response.status().as_str(),
        ])
        .inc();

    response
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "rugby-coach-backend" }))
}

async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello from the Rugby Coach backend!" }))
}

async fn test_cors(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "CORS is working!",
        "origin": state.config.frontend_url,
    }))
}

async fn echo(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let Json(data) = match payload {
        Ok(body) => body,
        Err(rejection) => return bad_json(rejection),
    };
    tracing::debug!("Echo received: {data}");

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Data received successfully",
            "receivedData": data,
        })),
    )
        .into_response()
}

async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics::gather_metrics(),
    )
        .into_response()
}

async fn get_llms_txt() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::llms_txt::LLMS_TXT,
    )
        .into_response()
}
