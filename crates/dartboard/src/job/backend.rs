//! Backend abstraction for job submission and status queries.

use std::future::Future;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::results::{IndexValueTable, RawRecord};

use super::types::{JobId, JobRequest, JobStatus, PageStatus};

/// Operations the dashboard needs from the analysis backend.
///
/// Implementations must be shareable across tasks; the monitor polls from a
/// spawned task while submissions run fire-and-forget.
pub trait JobBackend: Send + Sync {
    /// Post a job. The response carries no information beyond success.
    fn submit(&self, request: &JobRequest) -> impl Future<Output = Result<()>> + Send;

    /// Status of one job; `None` when the backend has no record of it yet.
    fn job_status(&self, job_id: JobId) -> impl Future<Output = Result<Option<JobStatus>>> + Send;

    /// Page-scoped status and progress.
    fn page_status(&self) -> impl Future<Output = Result<PageStatus>> + Send;

    /// Dataset details: `{"attributes": [[name, kind, values], ...]}`.
    fn attribute_config(&self) -> impl Future<Output = Result<Value>> + Send;

    /// Accumulated similarity records for the page.
    fn results(&self) -> impl Future<Output = Result<Vec<RawRecord>>> + Send;

    /// Per-record attribute values used for distributions.
    fn index_values(&self) -> impl Future<Output = Result<IndexValueTable>> + Send;

    /// Backend loading steps and whether each has finished.
    fn loading_status(&self) -> impl Future<Output = Result<IndexMap<String, bool>>> + Send;
}
