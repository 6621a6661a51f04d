//! Dashboard driver: ties the session, job monitor and level view into the
//! compare pipeline.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::error::{DartboardError, Result};
use crate::filter::{FilterSet, FormState};
use crate::job::{
    JobBackend, JobId, JobMonitor, JobPayload, JobType, LoadingMonitor, LoadingReport,
    MonitorCallbacks, MonitorOutcome, PageStatus,
};
use crate::results::{IndexValueTable, IngestReport};
use crate::session::Session;
use crate::view::{Activation, LevelFilterView};

/// Status text while filters are processed.
pub const FILTER_MESSAGE: &str = "Processing filters";
/// Status text while similarity is calculated.
pub const SIMILARITY_MESSAGE: &str = "Calculating similarity";

/// Receives page status updates while a job runs.
pub type StatusSink = Arc<dyn Fn(&str, &PageStatus) + Send + Sync>;

/// Summary of a completed comparison.
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub filters: FilterSet,
    pub filter_job: MonitorOutcome,
    pub similarity_job: MonitorOutcome,
    pub ingest: IngestReport,
}

/// Session, backend and results browser of one dashboard page.
pub struct Dashboard<B> {
    session: Session,
    monitor: JobMonitor<B>,
    view: LevelFilterView,
    index_values: Option<IndexValueTable>,
    excluded: Vec<String>,
    status_sink: Option<StatusSink>,
}

impl<B: JobBackend + 'static> Dashboard<B> {
    pub fn new(session: Session, backend: Arc<B>) -> Self {
        let monitor = JobMonitor::new(backend, session.config());
        Self {
            session,
            monitor,
            view: LevelFilterView::new(),
            index_values: None,
            excluded: Vec::new(),
            status_sink: None,
        }
    }

    /// Wait for the dataset to load and build the session from the
    /// backend's attribute configuration.
    pub async fn load(config: DashboardConfig, backend: Arc<B>) -> Result<(Self, LoadingReport)> {
        let outcome = LoadingMonitor::new(Arc::clone(&backend), &config)
            .load(config)
            .await;
        match outcome.session {
            Some(session) => Ok((Self::new(session, backend), outcome.report)),
            None => Err(DartboardError::DataShape(format!(
                "Dataset failed to load: {}",
                outcome.report.troubleshooting().join("; ")
            ))),
        }
    }

    /// Forward page status to `sink` while jobs run.
    pub fn with_status_sink(mut self, sink: StatusSink) -> Self {
        self.status_sink = Some(sink);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn view(&self) -> &LevelFilterView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut LevelFilterView {
        &mut self.view
    }

    pub fn backend(&self) -> &Arc<B> {
        self.monitor.backend()
    }

    /// Attributes excluded from shared criteria for the current results.
    pub fn excluded_attributes(&self) -> &[String] {
        &self.excluded
    }

    /// Run a comparison: validate, process filters, calculate similarity and
    /// ingest the results. Nothing is sent when either subgroup is empty.
    pub async fn compare(&mut self, form: &FormState) -> Result<CompareOutcome> {
        let filters = self.session.filter_model().process_filters(form)?;
        let similarity = JobPayload::similarity(&filters, self.session.attributes())?;

        let filter_job = self
            .run_job(JobType::FilterProcessing, JobPayload::filters(&filters), FILTER_MESSAGE)
            .await?;
        let similarity_job = self
            .run_job(JobType::SimilarityCalculation, similarity, SIMILARITY_MESSAGE)
            .await?;

        self.view.clear();
        self.index_values = None;
        self.excluded = filters.inherent_attributes().to_vec();
        let ingest = self.refresh_results().await?;
        info!(
            entries = self.view.store().len(),
            levels = self.view.facets().levels().len(),
            "comparison complete"
        );

        Ok(CompareOutcome {
            filters,
            filter_job,
            similarity_job,
            ingest,
        })
    }

    /// Validate a comparison and post only its filter processing job,
    /// without monitoring it.
    pub async fn submit_filters(&self, form: &FormState) -> Result<(FilterSet, JobId)> {
        let filters = self.session.filter_model().process_filters(form)?;
        filters.validate_for_comparison()?;
        let job_id = self
            .monitor
            .post(JobType::FilterProcessing, JobPayload::filters(&filters))
            .await?;
        Ok((filters, job_id))
    }

    /// Submit a job and wait for it to go idle.
    pub async fn run_job(
        &self,
        job_type: JobType,
        payload: JobPayload,
        message: &str,
    ) -> Result<MonitorOutcome> {
        let job_id = self.monitor.submit(job_type, payload);
        let mut callbacks = MonitorCallbacks::new();
        if let Some(sink) = self.status_sink.clone() {
            callbacks = callbacks.on_status(move |message, status| sink(message, status));
        }
        self.monitor.monitor(job_id, message, callbacks).wait().await
    }

    /// Fetch the backend's results and ingest any new records.
    pub async fn refresh_results(&mut self) -> Result<IngestReport> {
        let records = self.monitor.backend().results().await?;
        self.view.ingest(&records, &self.session, &self.excluded)
    }

    /// Activate an entry, fetching the index value table on first use.
    /// Without the table the panel shows headers only.
    pub async fn activate(&mut self, raw_index: usize) -> Result<Activation> {
        if self.index_values.is_none() {
            match self.monitor.backend().index_values().await {
                Ok(table) => self.index_values = Some(table),
                Err(e) => warn!("index values unavailable: {}", e),
            }
        }
        self.view
            .activate(raw_index, &self.session, self.index_values.as_ref())
    }
}
