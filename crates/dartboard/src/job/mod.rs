//! Backend jobs: submission, status polling and dataset loading.

mod backend;
mod http;
mod loading;
mod mock;
mod monitor;
mod types;

pub use backend::JobBackend;
pub use http::HttpBackend;
pub use loading::{
    LoadOutcome, LoadingMonitor, LoadingReport, StepStatus, CREATE_COLOR_SETS_STEP,
    STORE_ATTRIBUTES_STEP,
};
pub use mock::MockBackend;
pub use monitor::{JobMonitor, MonitorCallbacks, MonitorHandle, MonitorOutcome, MonitorState};
pub use types::{JobId, JobPayload, JobRequest, JobStatus, JobType, PageStatus, SimilarityPayload};
