use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use textgen_server::backend::CheckpointLoader;
use textgen_server::{api, AppState};
use tower::util::ServiceExt;

fn write_run(root: &Path, run_name: &str, corpus: &str) {
    let dir = root.join(run_name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("corpus.txt"), corpus).unwrap();
    std::fs::write(dir.join("hparams.json"), r#"{"seed": 1}"#).unwrap();
}

fn test_app(root: &Path) -> (Router, AppState) {
    let loader = Arc::new(CheckpointLoader::new(root));
    let state = AppState::new(loader, "dailydialog_run", root);
    (api::create_router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_generate(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_unset_then_loaded_run() {
    let temp = TempDir::new().unwrap();
    write_run(temp.path(), "chat_run", "hello there how are you<|endoftext|>fine thanks");
    let (app, _state) = test_app(temp.path());

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "current_run_name": null }));

    let request = json!({ "prompt": "hello", "run_name": "chat_run", "length": 6 });
    let (status, _) = send(&app, post_generate(request.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/health")).await;
    assert_eq!(body["current_run_name"], "chat_run");
}

#[tokio::test]
async fn test_generate_returns_text_and_effective_parameters() {
    let temp = TempDir::new().unwrap();
    write_run(temp.path(), "dailydialog_run", "hello there friend<|endoftext|>hello again");
    let (app, _state) = test_app(temp.path());

    let request = json!({
        "prompt": "hello",
        "length": 5000,
        "temperature": 0.0,
        "nsamples": 9,
    });
    let (status, body) = send(&app, post_generate(request.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let text = body["generated_text"].as_str().unwrap();
    assert!(!text.contains("<|endoftext|>"));
    assert_eq!(text, text.trim());

    assert_eq!(
        body["parameters"],
        json!({
            "prompt": "hello",
            "length": 1000,
            "temperature": 0.1,
            "top_p": 0.9,
            "nsamples": 5,
            "batch_size": 1,
            "run_name": "dailydialog_run",
        })
    );
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let temp = TempDir::new().unwrap();
    let (app, state) = test_app(temp.path());

    let (status, body) = send(&app, post_generate(Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No JSON data provided" }));

    let (status, body) = send(&app, post_generate("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");

    let (status, body) = send(&app, post_generate(r#"{"prompt": ""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Prompt is required" }));

    let (status, _) = send(&app, post_generate(r#"{"prompt": "x", "length": "long"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // None of these reached the residency manager
    assert_eq!(state.residency().stats().loads, 0);
    assert_eq!(state.residency().stats().failed_loads, 0);
}

#[tokio::test]
async fn test_missing_checkpoint_is_500_and_server_recovers() {
    let temp = TempDir::new().unwrap();
    write_run(temp.path(), "good_run", "one two three four");
    let (app, state) = test_app(temp.path());

    let ok = json!({ "prompt": "one", "run_name": "good_run" }).to_string();
    let (status, _) = send(&app, post_generate(ok.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let bad = json!({ "prompt": "one", "run_name": "no_such_run" }).to_string();
    let (status, body) = send(&app, post_generate(bad)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("no_such_run"));

    // Failed swap leaves the manager unloaded
    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["current_run_name"], Value::Null);

    let (status, _) = send(&app, post_generate(ok)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.residency().current_run_name().as_deref(), Some("good_run"));
}

#[tokio::test]
async fn test_path_traversal_run_name_is_rejected() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = test_app(temp.path());

    let request = json!({ "prompt": "x", "run_name": "../secrets" }).to_string();
    let (status, body) = send(&app, post_generate(request)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Invalid run name"));
}

#[tokio::test]
async fn test_swapping_runs_reloads_once_per_change() {
    let temp = TempDir::new().unwrap();
    write_run(temp.path(), "a", "alpha beta gamma");
    write_run(temp.path(), "b", "delta epsilon zeta");
    let (app, state) = test_app(temp.path());

    for run_name in ["a", "a", "b", "b", "a"] {
        let request = json!({ "prompt": "x", "run_name": run_name, "length": 3 });
        let (status, _) = send(&app, post_generate(request.to_string())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let stats = state.residency().stats();
    assert_eq!(stats.loads, 3);
    assert_eq!(stats.releases, 2);
    assert_eq!(stats.hits, 2);
    assert_eq!(state.residency().current_run_name().as_deref(), Some("a"));
}

#[tokio::test]
async fn test_list_models() {
    let temp = TempDir::new().unwrap();
    write_run(temp.path(), "shakespeare", "to be");
    write_run(temp.path(), "dailydialog_run", "hi");
    std::fs::create_dir_all(temp.path().join(".git")).unwrap();
    let (app, _state) = test_app(temp.path());

    let (status, body) = send(&app, get("/api/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "models": ["dailydialog_run", "shakespeare"] }));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let temp = TempDir::new().unwrap();
    let (app, _state) = test_app(temp.path());

    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
