// Integration tests for /api/render-video: marker validation, upstream status
// translation, timeout and connection-refused handling. The external worker is
// played by a stub axum server on an ephemeral port.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use manimate::config::{AppConfig, RendererConfig};
use manimate::renderer_client::RendererClient;
use manimate::{app, AppState};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const VALID_SCRIPT: &str = "from manim import *\n\nclass ConceptScene(Scene):\n    def construct(self):\n        self.play(Write(Text(\"hi\")))\n        self.wait(1)";

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/render", addr)
}

fn state_for(url: String, timeout_secs: u64) -> Arc<AppState> {
    let renderer_config = RendererConfig {
        url,
        auth_token: "test-token".to_string(),
        timeout_secs,
    };
    Arc::new(AppState {
        config: AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            renderer: Some(renderer_config.clone()),
        },
        gemini: None,
        renderer: Some(RendererClient::new(&renderer_config)),
    })
}

async fn post_render(state: Arc<AppState>, body: Value) -> (StatusCode, Value) {
    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/render-video")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Stub that counts hits and always answers with the given status and body.
fn counting_stub(status: StatusCode, body: Value) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_handle = hits.clone();
    let router = Router::new().route(
        "/render",
        post(move || {
            let hits = hits_handle.clone();
            let body = body.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (status, Json(body))
            }
        }),
    );
    (router, hits)
}

#[tokio::test]
async fn missing_code_field_is_rejected() {
    let (stub, hits) = counting_stub(StatusCode::OK, json!({"videoUrl": "unused"}));
    let url = spawn_stub(stub).await;

    let (status, body) = post_render(state_for(url, 300), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No manimCode provided");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scripts_missing_markers_never_reach_the_worker() {
    let (stub, hits) = counting_stub(StatusCode::OK, json!({"videoUrl": "unused"}));
    let url = spawn_stub(stub).await;
    let state = state_for(url, 300);

    let cases = [
        ("print('hi')", "Invalid Manim code: missing required imports"),
        (
            "from manim import *\nclass OtherScene(Scene):\n    def construct(self):\n        pass",
            "Invalid Manim code: missing ConceptScene class",
        ),
        (
            "from manim import *\nclass ConceptScene(Scene):\n    pass",
            "Invalid Manim code: missing construct method",
        ),
    ];

    for (code, expected) in cases {
        let (status, body) = post_render(state.clone(), json!({ "manimCode": code })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], expected);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn worker_401_maps_to_authentication_failure() {
    let (stub, _) = counting_stub(StatusCode::UNAUTHORIZED, json!({"error": "bad token"}));
    let url = spawn_stub(stub).await;

    let (status, body) = post_render(state_for(url, 300), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Authentication failed with rendering service");
}

#[tokio::test]
async fn worker_500_maps_to_render_failure() {
    let (stub, _) = counting_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "manim exploded"}),
    );
    let url = spawn_stub(stub).await;

    let (status, body) = post_render(state_for(url, 300), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Manim rendering failed. Please check your animation code."
    );
}

#[tokio::test]
async fn other_worker_statuses_are_named_in_the_error() {
    let (stub, _) = counting_stub(StatusCode::BAD_GATEWAY, json!({"error": "proxy sad"}));
    let url = spawn_stub(stub).await;

    let (status, body) = post_render(state_for(url, 300), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Video rendering service failed with status 502."
    );
}

#[tokio::test]
async fn successful_response_without_video_url_is_a_failure() {
    let (stub, _) = counting_stub(StatusCode::OK, json!({"status": "done"}));
    let url = spawn_stub(stub).await;

    let (status, body) = post_render(state_for(url, 300), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Rendering service did not return a video URL");
}

#[tokio::test]
async fn successful_render_returns_the_video_url() {
    let seen: Arc<Mutex<Option<(Option<String>, Value)>>> = Arc::new(Mutex::new(None));
    let seen_handle = seen.clone();
    let stub = Router::new().route(
        "/render",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let seen = seen_handle.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.to_string());
                *seen.lock().unwrap() = Some((auth, body));
                Json(json!({"videoUrl": "https://cdn.example.com/videos/pythagoras.mp4"}))
                    .into_response()
            }
        }),
    );
    let url = spawn_stub(stub).await;

    let (status, body) = post_render(state_for(url, 300), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["videoUrl"],
        "https://cdn.example.com/videos/pythagoras.mp4"
    );

    let (auth, forwarded) = seen.lock().unwrap().clone().expect("worker was called");
    assert_eq!(auth.as_deref(), Some("Bearer test-token"));
    assert_eq!(forwarded["code"], VALID_SCRIPT);
}

#[tokio::test]
async fn unreachable_worker_maps_to_service_unavailable() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/render", addr);
    let (status, body) = post_render(state_for(url, 300), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body["error"],
        "Cannot connect to rendering service. Please try again later."
    );
}

#[tokio::test]
async fn slow_worker_maps_to_gateway_timeout() {
    let stub = Router::new().route(
        "/render",
        post(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Json(json!({"videoUrl": "https://too.late/video.mp4"}))
        }),
    );
    let url = spawn_stub(stub).await;

    // 1 second render budget against a 5 second worker.
    let (status, body) = post_render(state_for(url, 1), json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        body["error"],
        "Video rendering timed out. Your animation might be too complex or the service is overloaded."
    );
}

#[tokio::test]
async fn render_without_configured_worker_reports_500() {
    let state = Arc::new(AppState {
        config: AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            renderer: None,
        },
        gemini: None,
        renderer: None,
    });

    let (status, body) = post_render(state, json!({ "manimCode": VALID_SCRIPT })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Rendering service is not configured");
}

#[tokio::test]
async fn status_endpoint_reports_configuration() {
    let (stub, _) = counting_stub(StatusCode::OK, json!({"videoUrl": "unused"}));
    let url = spawn_stub(stub).await;

    let response = app(state_for(url, 300))
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["services"]["renderer"], "configured");
    assert_eq!(body["services"]["gemini_ai"], "not_configured");
}
