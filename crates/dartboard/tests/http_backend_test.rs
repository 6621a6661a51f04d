//! The HTTP backend against a stub server on an ephemeral port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use dartboard::job::{JobId, JobStatus};
use dartboard::{Dashboard, DashboardConfig, DartboardError, FormState, HttpBackend, JobBackend};

#[derive(Default)]
struct Stub {
    submitted: Mutex<Vec<Value>>,
    results: Mutex<Value>,
}

async fn job_progress(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Json<Value> {
    stub.submitted.lock().unwrap().push(body);
    Json(json!({}))
}

async fn job_status(State(stub): State<Arc<Stub>>) -> Json<Value> {
    let statuses: serde_json::Map<String, Value> = stub
        .submitted
        .lock()
        .unwrap()
        .iter()
        .map(|job| (job["_job_id"].to_string(), json!("idle")))
        .collect();
    Json(Value::Object(statuses))
}

async fn page_status() -> Json<Value> {
    Json(json!({"status": "idle", "progress": 100}))
}

async fn dataset_details() -> Json<Value> {
    Json(json!({"attributes": [
        ["region", "categorical", ["east", "west"]],
        ["sex", "categorical", ["F", "M"]]
    ]}))
}

async fn compare_results(State(stub): State<Arc<Stub>>) -> Json<Value> {
    Json(stub.results.lock().unwrap().clone())
}

async fn index_values() -> Json<Value> {
    Json(json!({"region": ["east", "west"], "sex": ["F", "M"]}))
}

async fn loading_status() -> Json<Value> {
    Json(json!({"dataset-connected": true, "details-loaded": true}))
}

async fn spawn_stub(results: Value) -> (DashboardConfig, Arc<Stub>) {
    let stub = Arc::new(Stub {
        submitted: Mutex::new(Vec::new()),
        results: Mutex::new(results),
    });
    let app = Router::new()
        .route("/database/job-progress", post(job_progress))
        .route("/database/job-status", get(job_status))
        .route("/database/get-idx-attributes", get(index_values))
        .route("/status", get(page_status))
        .route("/get-dataset-details", get(dataset_details))
        .route("/compare-results", get(compare_results))
        .route("/loading-status", get(loading_status))
        .with_state(Arc::clone(&stub));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server runs");
    });

    let config = DashboardConfig::default()
        .with_base_url(format!("http://{}", addr))
        .with_page_name("/database/compare")
        .with_poll_interval(Duration::from_millis(20));
    (config, stub)
}

fn records() -> Value {
    json!([{
        "Subgroup 1": {"criteria": {"sex": "F", "region": "east"}, "indices": [0]},
        "Subgroup 2": {"criteria": {"sex": "M", "region": "east"}, "indices": [1]},
        "overall": 0.75,
        "sex": 0.75
    }])
}

#[tokio::test]
async fn test_compare_over_http() {
    let (config, stub) = spawn_stub(records()).await;
    let backend = Arc::new(HttpBackend::new(&config).unwrap());
    let (mut dashboard, report) = Dashboard::load(config, backend).await.unwrap();
    assert!(report.is_complete());

    let form = FormState::new()
        .with("filters[1][sex]", "F")
        .with("filters[2][sex]", "M");
    let outcome = dashboard.compare(&form).await.unwrap();
    assert_eq!(outcome.ingest.new_entries, vec![0]);
    assert_eq!(dashboard.view().store().entries()[0].level, 1);

    let submitted = stub.submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0]["_job_type"], "filter_processing");
    assert_eq!(submitted[0]["_page_name"], "/database/compare");
    assert_eq!(submitted[0]["1"], json!(["sex=F"]));
    assert_eq!(submitted[1]["_job_type"], "similarity_calculation");
    assert_eq!(submitted[1]["Subgroup 2"], json!([{"sex": "M"}]));
}

#[tokio::test]
async fn test_status_endpoints() {
    let (config, _stub) = spawn_stub(json!({})).await;
    let backend = HttpBackend::new(&config).unwrap();

    assert_eq!(backend.job_status(JobId(42)).await.unwrap(), None);
    assert!(backend.results().await.unwrap().is_empty());

    let status = backend.page_status().await.unwrap();
    assert_eq!(status.job_status(), Some(JobStatus::Idle));
    assert_eq!(status.progress_value(), Some(100.0));

    let table = backend.index_values().await.unwrap();
    assert_eq!(table.value_at("sex", 1).as_deref(), Some("M"));
}

#[tokio::test]
async fn test_unreachable_backend_is_config_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = DashboardConfig::default().with_base_url(format!("http://{}", addr));
    let backend = HttpBackend::new(&config).unwrap();
    let err = backend.loading_status().await.unwrap_err();
    assert!(matches!(err, DartboardError::Config(_)), "unexpected {:?}", err);
}
