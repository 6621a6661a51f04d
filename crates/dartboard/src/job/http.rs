//! HTTP implementation of [`JobBackend`].

use indexmap::IndexMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::error::{DartboardError, Result};
use crate::results::{IndexValueTable, RawRecord};

use super::backend::JobBackend;
use super::types::{JobId, JobRequest, JobStatus, PageStatus};

/// Page-relative endpoints.
const JOB_PROGRESS_PATH: &str = "job-progress";
const JOB_STATUS_PATH: &str = "job-status";
const INDEX_VALUES_PATH: &str = "get-idx-attributes";

/// Root endpoints.
const PAGE_STATUS_PATH: &str = "/status";
const DATASET_DETAILS_PATH: &str = "/get-dataset-details";
const RESULTS_PATH: &str = "/compare-results";
const LOADING_STATUS_PATH: &str = "/loading-status";

/// Backend reached over HTTP with JSON bodies.
pub struct HttpBackend {
    client: Client,
    config: DashboardConfig,
}

impl HttpBackend {
    /// Create a backend client for the configured base URL.
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DartboardError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// URL of a path relative to the page's directory
    /// (`/database/compare` + `job-status` -> `/database/job-status`).
    fn page_url(&self, path: &str) -> String {
        let directory = self
            .config
            .page_name
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or_default();
        self.config.endpoint(&format!("{}/{}", directory, path))
    }

    fn connect_error(&self, e: reqwest::Error) -> DartboardError {
        if e.is_connect() {
            DartboardError::Config(format!(
                "Failed to connect to backend at {}. Is it running?",
                self.config.base_url
            ))
        } else {
            DartboardError::Http(e)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl JobBackend for HttpBackend {
    async fn submit(&self, request: &JobRequest) -> Result<()> {
        let url = self.page_url(JOB_PROGRESS_PATH);
        debug!(url, job_id = %request.job_id, job_type = request.job_type.as_str(), "POST");
        self.client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?
            .error_for_status()?;
        Ok(())
    }

    async fn job_status(&self, job_id: JobId) -> Result<Option<JobStatus>> {
        let statuses: IndexMap<String, Value> = self.get_json(&self.page_url(JOB_STATUS_PATH)).await?;
        Ok(match statuses.get(&job_id.to_string()) {
            Some(Value::String(status)) => {
                let parsed = JobStatus::parse(status);
                if parsed.is_none() {
                    warn!(%job_id, status, "unrecognized job status");
                }
                parsed
            }
            _ => None,
        })
    }

    async fn page_status(&self) -> Result<PageStatus> {
        self.get_json(&self.config.endpoint(PAGE_STATUS_PATH)).await
    }

    async fn attribute_config(&self) -> Result<Value> {
        self.get_json(&self.config.endpoint(DATASET_DETAILS_PATH)).await
    }

    async fn results(&self) -> Result<Vec<RawRecord>> {
        let value: Value = self.get_json(&self.config.endpoint(RESULTS_PATH)).await?;
        if value.is_array() {
            return Ok(serde_json::from_value(value)?);
        }
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Object(map) if map.is_empty() => Ok(Vec::new()),
            other => Err(DartboardError::DataShape(format!(
                "Expected a list of similarity records, got {}",
                other
            ))),
        }
    }

    async fn index_values(&self) -> Result<IndexValueTable> {
        let value: Value = self.get_json(&self.page_url(INDEX_VALUES_PATH)).await?;
        IndexValueTable::from_value(value)
    }

    async fn loading_status(&self) -> Result<IndexMap<String, bool>> {
        self.get_json(&self.config.endpoint(LOADING_STATUS_PATH)).await
    }
}
