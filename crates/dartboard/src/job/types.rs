//! Job identifiers, requests and status payloads.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DartboardError, Result};
use crate::filter::{FilterSet, FilterSetWire, EMPTY_SUBGROUP_MESSAGE, GROUP_ONE, GROUP_TWO};
use crate::schema::AttributeConfig;

static LAST_JOB_ID: AtomicI64 = AtomicI64::new(0);

/// Client-generated job id: epoch milliseconds, bumped when two jobs are
/// created within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl JobId {
    /// A fresh id, strictly greater than any issued before in this process.
    pub fn next() -> Self {
        let now = Utc::now().timestamp_millis();
        let previous = LAST_JOB_ID
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        JobId(now.max(previous + 1))
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation tag sent with a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FilterProcessing,
    SimilarityCalculation,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FilterProcessing => "filter_processing",
            JobType::SimilarityCalculation => "similarity_calculation",
        }
    }
}

/// Backend-reported state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    /// Not running; since jobs are fire-and-forget this means finished.
    Idle,
}

impl JobStatus {
    /// Parse a status string; unknown strings are `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "running" => Some(JobStatus::Running),
            "idle" => Some(JobStatus::Idle),
            _ => None,
        }
    }
}

/// Body of a similarity request: per-subgroup `{attribute: value}` lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityPayload {
    #[serde(rename = "Subgroup 1")]
    pub subgroup_1: Vec<IndexMap<String, String>>,
    #[serde(rename = "Subgroup 2")]
    pub subgroup_2: Vec<IndexMap<String, String>>,
    #[serde(rename = "remove-inherent")]
    pub remove_inherent: bool,
    #[serde(rename = "similarity-attributes")]
    pub similarity_attributes: Vec<String>,
}

/// Job-specific part of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobPayload {
    Filters(FilterSetWire),
    Similarity(SimilarityPayload),
}

impl JobPayload {
    /// Filter processing payload.
    pub fn filters(filters: &FilterSet) -> Self {
        JobPayload::Filters(filters.to_wire())
    }

    /// Similarity payload. Both subgroups must be constrained, and numeric
    /// ranges must admit at least one of the attribute's values.
    pub fn similarity(filters: &FilterSet, attributes: &AttributeConfig) -> Result<Self> {
        filters.validate_for_comparison()?;
        let subgroup_1 = filters.flattened_criteria(GROUP_ONE, attributes)?;
        let subgroup_2 = filters.flattened_criteria(GROUP_TWO, attributes)?;
        if subgroup_1.is_empty() || subgroup_2.is_empty() {
            return Err(DartboardError::Validation(EMPTY_SUBGROUP_MESSAGE.to_string()));
        }
        Ok(JobPayload::Similarity(SimilarityPayload {
            subgroup_1,
            subgroup_2,
            remove_inherent: filters.remove_inherent,
            similarity_attributes: filters.similarity_attributes.clone(),
        }))
    }
}

/// A job submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    #[serde(rename = "_job_id")]
    pub job_id: JobId,
    #[serde(rename = "_job_type")]
    pub job_type: JobType,
    #[serde(rename = "_page_name")]
    pub page_name: String,
    #[serde(flatten)]
    pub payload: JobPayload,
}

/// Page-scoped status: overall state, progress and whatever result fields
/// the page publishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<Value>,
    #[serde(flatten)]
    pub payload: IndexMap<String, Value>,
}

impl PageStatus {
    pub fn job_status(&self) -> Option<JobStatus> {
        self.status.as_deref().and_then(JobStatus::parse)
    }

    /// Progress as a number, accepting numeric strings.
    pub fn progress_value(&self) -> Option<f64> {
        match self.progress.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        }
    }
}
