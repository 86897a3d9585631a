// Integration tests for the HTTP surface: routing, validation, fallback and CORS.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rugby_coach_backend::api::{router, AppState};
use rugby_coach_backend::config::Config;
use rugby_coach_backend::llm::{ChatMessage, CompletionError, CompletionProvider, OpenAiClient};

const FRONTEND: &str = "http://rugby.example.com";

/// Provider that always fails the way an unauthorized upstream would.
#[derive(Default)]
struct DownProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionProvider for DownProvider {
    async fn complete(&self, _: &[ChatMessage], _: f32) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CompletionError::Status {
            status: 401,
            body: "invalid api key".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "down"
    }
}

/// Provider whose model answers with nothing at all.
struct BlankProvider;

#[async_trait]
impl CompletionProvider for BlankProvider {
    async fn complete(&self, _: &[ChatMessage], _: f32) -> Result<String, CompletionError> {
        Ok(String::new())
    }

    fn model_name(&self) -> &str {
        "blank"
    }
}

/// Provider that echoes the user prompt back as the analysis.
struct EchoProvider;

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _: f32,
    ) -> Result<String, CompletionError> {
        Ok(format!("Model says:\n{}", messages[1].content))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn config() -> Config {
    Config {
        frontend_url: FRONTEND.to_string(),
        ..Config::default()
    }
}

fn app_with(provider: Arc<dyn CompletionProvider>) -> axum::Router {
    router(AppState::new(config(), provider))
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

// ── /api/players ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_prop_with_dependency_down_gets_fallback() {
    let provider = Arc::new(DownProvider::default());
    let app = app_with(provider.clone());

    let (status, body) = send(
        app,
        post_json(
            "/api/players",
            &json!({ "age": 25, "position": "Prop", "weight": 110, "height": 185 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["message"].as_str().unwrap().contains("mock data"));
    assert_eq!(body["source"], "fallback");
    assert!(body["openaiError"].as_str().unwrap().contains("401"));
    let analysis = body["analysis"].as_str().unwrap();
    assert!(analysis.contains("Prop"));
    assert!(analysis.contains("25"));
    assert!(analysis.contains("185cm"));
    assert!(analysis.contains("110kg"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_age_is_rejected_before_upstream() {
    let provider = Arc::new(DownProvider::default());
    let app = app_with(provider.clone());

    let (status, body) = send(
        app,
        post_json(
            "/api/players",
            &json!({ "position": "Wing", "weight": 80, "height": 180 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "All fields are required" }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_missing_field_is_rejected_regardless_of_description() {
    let full = json!({ "age": 30, "position": "Hooker", "weight": 105, "height": 180 });
    for field in ["age", "position", "weight", "height"] {
        for description in [None, Some(""), Some("Experienced captain")] {
            let mut body = full.clone();
            let obj = body.as_object_mut().unwrap();
            obj.remove(field);
            if let Some(d) = description {
                obj.insert("description".to_string(), json!(d));
            }
            let (status, response) =
                send(app_with(Arc::new(DownProvider::default())), post_json("/api/players", &body))
                    .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "without {field}");
            assert_eq!(response["error"], "All fields are required");
        }
    }
}

#[tokio::test]
async fn test_invalid_field_reports_details() {
    let (status, body) = send(
        app_with(Arc::new(DownProvider::default())),
        post_json(
            "/api/players",
            &json!({ "age": 20, "position": "Goalkeeper", "weight": 80, "height": 180 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid player data");
    assert!(body["details"].as_str().unwrap().starts_with("position"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/players")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .expect("request");
    let (status, body) = send(app_with(Arc::new(DownProvider::default())), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn test_blank_model_reply_is_served_as_fallback() {
    let (status, body) = send(
        app_with(Arc::new(BlankProvider)),
        post_json(
            "/api/players",
            &json!({ "age": 25, "position": "Prop", "weight": 110, "height": 185 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source"], "fallback");
    assert!(body["message"].as_str().unwrap().contains("mock data"));
    assert!(body["openaiError"].is_string());
    let analysis = body["analysis"].as_str().unwrap();
    assert!(!analysis.trim().is_empty());
    assert!(analysis.contains("110kg"));
}

#[tokio::test]
async fn test_fallback_quotes_submitted_values() {
    let (status, body) = send(
        app_with(Arc::new(DownProvider::default())),
        post_json(
            "/api/players",
            &json!({ "age": 25, "position": "prop", "weight": "110.0", "height": "185.50" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source"], "fallback");
    let analysis = body["analysis"].as_str().unwrap();
    assert!(analysis.starts_with("# Player Analysis: prop\n"));
    assert!(analysis.contains("110.0kg"));
    assert!(analysis.contains("185.50cm"));
}

#[tokio::test]
async fn test_whitespace_description_reaches_the_model() {
    let (_, body) = send(
        app_with(Arc::new(EchoProvider)),
        post_json(
            "/api/players",
            &json!({
                "age": 25, "position": "Prop", "weight": 110, "height": 185,
                "description": "   "
            }),
        ),
    )
    .await;

    let analysis = body["analysis"].as_str().unwrap();
    assert!(analysis.contains("Description:    \n"));
    assert!(!analysis.contains("None provided"));
}

#[tokio::test]
async fn test_model_text_is_returned_verbatim() {
    let (status, body) = send(
        app_with(Arc::new(EchoProvider)),
        post_json(
            "/api/players",
            &json!({
                "age": 21, "position": "Scrum-half", "weight": 75.5, "height": 172,
                "description": "Quick service"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Player information processed successfully");
    assert_eq!(body["source"], "model");
    assert!(body.get("openaiError").is_none());
    let analysis = body["analysis"].as_str().unwrap();
    assert!(analysis.starts_with("Model says:"));
    assert!(analysis.contains("Position: Scrum-half"));
    assert!(analysis.contains("Description: Quick service"));
}

#[tokio::test]
async fn test_missing_api_key_falls_back_with_real_client() {
    let client = OpenAiClient::new(&config()).unwrap();
    let (status, body) = send(
        app_with(Arc::new(client)),
        post_json(
            "/api/players",
            &json!({ "age": 19, "position": "Wing", "weight": 82, "height": 183 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["openaiError"], "OpenAI API key is not configured");
    assert!(!body["analysis"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_submission_has_same_shape() {
    let payload = json!({ "age": 28, "position": "Center", "weight": 95, "height": 186 });
    let (_, first) = send(
        app_with(Arc::new(DownProvider::default())),
        post_json("/api/players", &payload),
    )
    .await;
    let (_, second) = send(
        app_with(Arc::new(DownProvider::default())),
        post_json("/api/players", &payload),
    )
    .await;

    let keys = |v: &Value| {
        let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&first), keys(&second));
}

// ── Other routes ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_cors_check_reports_configured_origin() {
    let (status, body) = send(app_with(Arc::new(EchoProvider)), get("/api/test-cors")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "CORS is working!", "origin": FRONTEND })
    );
}

#[tokio::test]
async fn test_preflight_is_answered_with_allowed_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/players")
        .header(header::ORIGIN, FRONTEND)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("request");
    let response = app_with(Arc::new(EchoProvider))
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(FRONTEND)
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "{method} missing from {methods}");
    }
}

#[tokio::test]
async fn test_foreign_origin_is_not_echoed() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/hello")
        .header(header::ORIGIN, "http://evil.example.com")
        .body(Body::empty())
        .expect("request");
    let response = app_with(Arc::new(EchoProvider))
        .oneshot(request)
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://evil.example.com")
    );
}

#[tokio::test]
async fn test_hello_and_health() {
    let (status, body) = send(app_with(Arc::new(EchoProvider)), get("/api/hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().starts_with("Hello"));

    let (status, body) = send(app_with(Arc::new(EchoProvider)), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_echo_returns_received_data() {
    let payload = json!({ "anything": [1, 2, 3], "nested": { "ok": true } });
    let (status, body) = send(
        app_with(Arc::new(EchoProvider)),
        post_json("/api/echo", &payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Data received successfully");
    assert_eq!(body["receivedData"], payload);
}

#[tokio::test]
async fn test_metrics_and_llms_txt_are_plain_text() {
    rugby_coach_backend::metrics::register_metrics();
    let app = app_with(Arc::new(DownProvider::default()));
    let _ = send(
        app.clone(),
        post_json(
            "/api/players",
            &json!({ "age": 25, "position": "Lock", "weight": 118, "height": 200 }),
        ),
    )
    .await;

    let response = app.clone().oneshot(get("/metrics")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("rugby_player_submissions_total"));
    assert!(text.contains("rugby_api_requests_total"));

    let response = app.oneshot(get("/llms.txt")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.expect("body").to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("/api/players"));
}
