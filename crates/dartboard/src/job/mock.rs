//! In-memory backend for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{DartboardError, Result};
use crate::results::{IndexValueTable, RawRecord};

use super::backend::JobBackend;
use super::types::{JobId, JobRequest, JobStatus, PageStatus};

#[derive(Debug, Default)]
struct MockState {
    statuses: VecDeque<Option<JobStatus>>,
    loading: VecDeque<IndexMap<String, bool>>,
    submitted: Vec<JobRequest>,
    polled: Vec<JobId>,
    page_status: PageStatus,
    attribute_config: Value,
    results: Vec<RawRecord>,
    index_values: IndexValueTable,
    fail_submissions: bool,
}

/// Backend that replays scripted job statuses and records submissions.
///
/// Job statuses are consumed one per poll regardless of job id; once the
/// script runs out every job reports idle. Loading statuses work the same
/// way, repeating the last scripted map.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue statuses returned by successive polls.
    pub fn with_job_statuses(self, statuses: impl IntoIterator<Item = Option<JobStatus>>) -> Self {
        self.state().statuses.extend(statuses);
        self
    }

    /// Queue loading-status maps returned by successive polls.
    pub fn with_loading_statuses(
        self,
        statuses: impl IntoIterator<Item = IndexMap<String, bool>>,
    ) -> Self {
        self.state().loading.extend(statuses);
        self
    }

    pub fn with_attribute_config(self, details: Value) -> Self {
        self.state().attribute_config = details;
        self
    }

    pub fn with_results(self, results: Vec<RawRecord>) -> Self {
        self.state().results = results;
        self
    }

    pub fn with_index_values(self, table: IndexValueTable) -> Self {
        self.state().index_values = table;
        self
    }

    pub fn with_page_status(self, status: PageStatus) -> Self {
        self.state().page_status = status;
        self
    }

    /// Make every submission fail.
    pub fn with_failing_submissions(self) -> Self {
        self.state().fail_submissions = true;
        self
    }

    /// Replace the results returned from now on.
    pub fn set_results(&self, results: Vec<RawRecord>) {
        self.state().results = results;
    }

    /// Requests received so far.
    pub fn submitted(&self) -> Vec<JobRequest> {
        self.state().submitted.clone()
    }

    /// Job ids polled so far, one per status query.
    pub fn polled(&self) -> Vec<JobId> {
        self.state().polled.clone()
    }
}

impl JobBackend for MockBackend {
    async fn submit(&self, request: &JobRequest) -> Result<()> {
        let mut state = self.state();
        if state.fail_submissions {
            return Err(DartboardError::Config(format!(
                "Submission of job {} rejected",
                request.job_id
            )));
        }
        state.submitted.push(request.clone());
        Ok(())
    }

    async fn job_status(&self, job_id: JobId) -> Result<Option<JobStatus>> {
        let mut state = self.state();
        state.polled.push(job_id);
        Ok(state.statuses.pop_front().unwrap_or(Some(JobStatus::Idle)))
    }

    async fn page_status(&self) -> Result<PageStatus> {
        Ok(self.state().page_status.clone())
    }

    async fn attribute_config(&self) -> Result<Value> {
        Ok(self.state().attribute_config.clone())
    }

    async fn results(&self) -> Result<Vec<RawRecord>> {
        Ok(self.state().results.clone())
    }

    async fn index_values(&self) -> Result<IndexValueTable> {
        Ok(self.state().index_values.clone())
    }

    async fn loading_status(&self) -> Result<IndexMap<String, bool>> {
        let mut state = self.state();
        if state.loading.len() > 1 {
            Ok(state.loading.pop_front().unwrap_or_default())
        } else {
            Ok(state.loading.front().cloned().unwrap_or_default())
        }
    }
}
