//! End-to-end pipeline against the in-memory backend: submit, monitor,
//! ingest and browse.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use dartboard::job::{JobId, JobStatus, JobType, MonitorCallbacks, MonitorState, PageStatus};
use dartboard::results::IndexValueTable;
use dartboard::view::{Activation, FacetGroup};
use dartboard::{
    Dashboard, DashboardConfig, DartboardError, FormState, JobMonitor, MockBackend, RawRecord,
};

fn details() -> serde_json::Value {
    json!({"attributes": [
        ["region", "categorical", ["east", "west"]],
        ["sex", "categorical", ["F", "M"]],
        ["age", "numeric", {"min": 0, "max": 90}]
    ]})
}

fn records() -> Vec<RawRecord> {
    serde_json::from_value(json!([
        {
            "Subgroup 1": {"criteria": {"sex": "F"}, "indices": [0, 1]},
            "Subgroup 2": {"criteria": {"sex": "M"}, "indices": [2, 3]},
            "overall": 0.42, "age": 0.5, "region": 0.34
        },
        {
            "Subgroup 1": {"criteria": {"sex": "F", "region": "east"}, "indices": [0]},
            "Subgroup 2": {"criteria": {"sex": "M", "region": "east"}, "indices": [2]},
            "overall": 0.61, "age": 0.61
        }
    ]))
    .expect("valid records")
}

fn index_values() -> IndexValueTable {
    IndexValueTable::from_value(json!({
        "region": ["east", "west", "east", "west"],
        "sex": ["F", "F", "M", "M"],
        "age": [20, 30, 30, 40]
    }))
    .expect("valid index table")
}

fn compare_form() -> FormState {
    FormState::new()
        .with("filters[1][sex]", "F")
        .with("filters[2][sex]", "M")
        .with("filters[linked][similarity_attributes]", "age")
        .with("filters[linked][similarity_attributes]", "region")
}

async fn loaded_dashboard(backend: MockBackend) -> Dashboard<MockBackend> {
    let backend = backend
        .with_loading_statuses([[("dataset-connected".to_string(), true)].into_iter().collect()])
        .with_attribute_config(details());
    let (dashboard, report) = Dashboard::load(DashboardConfig::default(), Arc::new(backend))
        .await
        .expect("dataset loads");
    assert!(report.is_complete());
    dashboard
}

// =============================================================================
// Monitoring
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_monitor_running_three_times_then_idle() {
    let backend = Arc::new(MockBackend::new().with_job_statuses([
        Some(JobStatus::Running),
        Some(JobStatus::Running),
        Some(JobStatus::Running),
        Some(JobStatus::Idle),
        Some(JobStatus::Running),
    ]));
    let monitor = JobMonitor::new(Arc::clone(&backend), &DashboardConfig::default());

    let updates = Arc::new(AtomicU32::new(0));
    let completes = Arc::new(AtomicU32::new(0));
    let (u, c) = (Arc::clone(&updates), Arc::clone(&completes));
    let handle = monitor.monitor(
        JobId(123),
        "Processing filters",
        MonitorCallbacks::new()
            .on_update(move || {
                u.fetch_add(1, Ordering::SeqCst);
            })
            .on_complete(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
    );
    let outcome = handle.wait().await.expect("job completes");

    assert_eq!(updates.load(Ordering::SeqCst), 3);
    assert_eq!(completes.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.polls, 4);

    // No poll after the idle response.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.polled(), vec![JobId(123); 4]);
}

#[tokio::test(start_paused = true)]
async fn test_status_sink_receives_progress() {
    let backend = Arc::new(
        MockBackend::new()
            .with_job_statuses([Some(JobStatus::Running), Some(JobStatus::Idle)])
            .with_page_status(
                serde_json::from_value::<PageStatus>(json!({"status": "running", "progress": 0.5}))
                    .unwrap(),
            ),
    );
    let monitor = JobMonitor::new(backend, &DashboardConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let handle = monitor.monitor(
        JobId(5),
        "Calculating similarity",
        MonitorCallbacks::new().on_status(move |message, status| {
            sink.lock()
                .unwrap()
                .push((message.to_string(), status.progress_value()));
        }),
    );
    assert_eq!(handle.message(), "Calculating similarity");
    handle.wait().await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![("Calculating similarity".to_string(), Some(0.5))]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_submission_ends_as_not_found() {
    let backend = Arc::new(
        MockBackend::new()
            .with_failing_submissions()
            .with_job_statuses([None, None, None, None, None]),
    );
    let monitor = JobMonitor::new(Arc::clone(&backend), &DashboardConfig::default());
    let job_id = monitor.submit(
        JobType::FilterProcessing,
        dartboard::job::JobPayload::filters(&Default::default()),
    );

    let handle = monitor.monitor(job_id, "Processing filters", MonitorCallbacks::new());
    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, DartboardError::JobNotFound { attempts: 5, .. }));
    assert!(backend.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_handle_state_tracks_job() {
    let backend = Arc::new(MockBackend::new().with_job_statuses([Some(JobStatus::Running); 3]));
    let monitor = JobMonitor::new(backend, &DashboardConfig::default());
    let handle = monitor.monitor(JobId(9), "Processing filters", MonitorCallbacks::new());

    assert_eq!(handle.state(), MonitorState::Running);
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(handle.state(), MonitorState::Idle);
    handle.wait().await.unwrap();
}

// =============================================================================
// Compare pipeline
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_compare_submits_both_jobs_and_ingests() {
    let backend = MockBackend::new()
        .with_job_statuses([
            Some(JobStatus::Running),
            Some(JobStatus::Idle),
            Some(JobStatus::Running),
            Some(JobStatus::Running),
            Some(JobStatus::Idle),
        ])
        .with_results(records())
        .with_index_values(index_values());
    let mut dashboard = loaded_dashboard(backend).await;

    let outcome = dashboard.compare(&compare_form()).await.expect("comparison runs");
    assert_eq!(outcome.filter_job.polls, 2);
    assert_eq!(outcome.similarity_job.polls, 3);
    assert_eq!(outcome.ingest.new_entries, vec![0, 1]);
    assert_eq!(dashboard.excluded_attributes(), ["sex"]);

    let submitted = dashboard.backend().submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].job_type, JobType::FilterProcessing);
    assert_eq!(submitted[1].job_type, JobType::SimilarityCalculation);
    assert!(submitted[1].job_id > submitted[0].job_id);

    let body = serde_json::to_value(&submitted[1]).unwrap();
    assert_eq!(body["Subgroup 1"], json!([{"sex": "F"}]));
    assert_eq!(body["Subgroup 2"], json!([{"sex": "M"}]));
    assert_eq!(body["similarity-attributes"], json!(["age", "region"]));
}

#[tokio::test(start_paused = true)]
async fn test_compare_sends_values_covered_by_range() {
    let backend = MockBackend::new().with_results(records());
    let mut dashboard = loaded_dashboard(backend).await;
    let form = FormState::new()
        .with("filters[1][age][lower-bound]", "30")
        .with("filters[1][age][lower-operator]", ">")
        .with("filters[1][age][upper-bound]", "33")
        .with("filters[1][age][upper-operator]", "<")
        .with("filters[1][age][join]", "and")
        .with("filters[2][sex]", "M");

    dashboard.compare(&form).await.expect("comparison runs");

    let submitted = dashboard.backend().submitted();
    let filters = serde_json::to_value(&submitted[0]).unwrap();
    assert_eq!(filters["1"], json!(["age>30 and age<33"]));
    let similarity = serde_json::to_value(&submitted[1]).unwrap();
    assert_eq!(similarity["Subgroup 1"], json!([{"age": "31"}, {"age": "32"}]));
    assert_eq!(similarity["Subgroup 2"], json!([{"sex": "M"}]));
}

#[tokio::test(start_paused = true)]
async fn test_shared_region_gives_level_one_entry() {
    let backend = MockBackend::new().with_results(records());
    let mut dashboard = loaded_dashboard(backend).await;
    dashboard.compare(&compare_form()).await.unwrap();

    let entry = &dashboard.view().store().entries()[1];
    assert_eq!(entry.level, 1);
    assert_eq!(entry.shared_criteria.get("region").map(String::as_str), Some("east"));
    assert_eq!(entry.shared_criteria.len(), 1);

    let session = dashboard.session().clone();
    let rows = dashboard.view().visible_rows(&session);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].level, 0);

    dashboard.view_mut().select_level(1).unwrap();
    let rows = dashboard.view().visible_rows(&session);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "region: east");

    dashboard
        .view_mut()
        .facets_mut()
        .set(&FacetGroup::Attribute("region".into()), "east", false)
        .unwrap();
    assert!(dashboard.view().visible_rows(&session).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_only_appends_new_records() {
    let all = records();
    let backend = MockBackend::new().with_results(all[..1].to_vec());
    let mut dashboard = loaded_dashboard(backend).await;
    dashboard.compare(&compare_form()).await.unwrap();
    assert_eq!(dashboard.view().store().len(), 1);

    dashboard.backend().set_results(all);
    let report = dashboard.refresh_results().await.unwrap();
    assert_eq!(report.new_entries, vec![1]);
    assert_eq!(report.new_levels, vec![1]);

    let report = dashboard.refresh_results().await.unwrap();
    assert!(report.new_entries.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_activation_builds_distributions() {
    let backend = MockBackend::new()
        .with_results(records())
        .with_index_values(index_values());
    let mut dashboard = loaded_dashboard(backend).await;
    dashboard.compare(&compare_form()).await.unwrap();

    assert_eq!(
        dashboard.activate(0).await.unwrap(),
        Activation::Activated { previous: None }
    );
    assert_eq!(dashboard.activate(0).await.unwrap(), Activation::AlreadyActive);

    let panel = dashboard.view().detail().expect("detail panel");
    let region = panel.card("region").expect("region card");
    let view = region.distribution.as_ref().expect("region distribution");
    assert_eq!(
        view.proportions[0],
        vec![("east".to_string(), 0.5), ("west".to_string(), 0.5)]
    );
    assert_eq!(view.charts[0].bars.len(), 2);

    assert_eq!(
        dashboard.activate(1).await.unwrap(),
        Activation::Activated { previous: Some(0) }
    );
    assert_eq!(dashboard.view().detail().unwrap().raw_index, 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_subgroup_is_rejected_before_network() {
    let mut dashboard = loaded_dashboard(MockBackend::new()).await;
    let form = FormState::new().with("filters[2][sex]", "M");

    let err = dashboard.compare(&form).await.unwrap_err();
    assert!(matches!(err, DartboardError::Validation(_)));
    assert!(dashboard.backend().submitted().is_empty());
    assert!(dashboard.backend().polled().is_empty());
}
