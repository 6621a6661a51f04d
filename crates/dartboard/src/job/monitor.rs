//! Job submission and status polling.
//!
//! A monitored job moves `Idle -> Running -> Idle` on success, or
//! `Running -> Invalid` once the backend has failed to report it for the
//! configured number of polls. Cancelling stops polling without firing any
//! callback.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::DashboardConfig;
use crate::error::{DartboardError, Result};

use super::backend::JobBackend;
use super::types::{JobId, JobPayload, JobRequest, JobStatus, JobType, PageStatus};

/// Lifecycle of a monitored job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Running,
    Invalid,
    Cancelled,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MonitorState::Running)
    }
}

type UpdateFn = Box<dyn FnMut() + Send>;
type CompleteFn = Box<dyn FnOnce() + Send>;
type StatusFn = Box<dyn FnMut(&str, &PageStatus) + Send>;

/// Callbacks fired while a job is monitored.
///
/// `on_update` runs after every poll that finds the job running,
/// `on_complete` once when it goes idle, and `on_status` receives the page
/// status fetched alongside each running poll.
#[derive(Default)]
pub struct MonitorCallbacks {
    on_update: Option<UpdateFn>,
    on_complete: Option<CompleteFn>,
    on_status: Option<StatusFn>,
}

impl MonitorCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_update(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_status(mut self, f: impl FnMut(&str, &PageStatus) + Send + 'static) -> Self {
        self.on_status = Some(Box::new(f));
        self
    }
}

/// Summary of a job that reached idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOutcome {
    pub job_id: JobId,
    /// Status queries issued, including the final one.
    pub polls: u32,
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    job_id: JobId,
    message: String,
    cancel: watch::Sender<bool>,
    state: watch::Receiver<MonitorState>,
    task: JoinHandle<Result<MonitorOutcome>>,
}

impl MonitorHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Status text shown while the job runs.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Stop polling. No callback fires after this; a job already in a
    /// terminal state is unaffected.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Wait for the monitor to reach a terminal state.
    pub async fn wait(self) -> Result<MonitorOutcome> {
        // Keep the sender alive until the task finishes.
        let _cancel = self.cancel;
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(job_id = %self.job_id, "monitor task failed: {}", e);
                Err(DartboardError::Cancelled)
            }
        }
    }
}

/// Submits jobs and tracks them to completion.
pub struct JobMonitor<B> {
    backend: Arc<B>,
    page_name: String,
    poll_interval: Duration,
    not_found_retries: u32,
}

impl<B: JobBackend + 'static> JobMonitor<B> {
    pub fn new(backend: Arc<B>, config: &DashboardConfig) -> Self {
        Self {
            backend,
            page_name: config.page_name.clone(),
            poll_interval: config.poll_interval(),
            not_found_retries: config.not_found_retries.max(1),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_not_found_retries(mut self, retries: u32) -> Self {
        self.not_found_retries = retries.max(1);
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn request(&self, job_type: JobType, payload: JobPayload) -> JobRequest {
        let request = JobRequest {
            job_id: JobId::next(),
            job_type,
            page_name: self.page_name.clone(),
            payload,
        };
        info!(job_id = %request.job_id, job_type = job_type.as_str(), "submitting job");
        request
    }

    /// Assign a fresh id and post the job without waiting for the response.
    /// Submission failures are logged; the monitor will then report the job
    /// as not found.
    pub fn submit(&self, job_type: JobType, payload: JobPayload) -> JobId {
        let request = self.request(job_type, payload);
        let job_id = request.job_id;

        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.submit(&request).await {
                error!(job_id = %request.job_id, "job submission failed: {}", e);
            }
        });
        job_id
    }

    /// Assign a fresh id and post the job, returning once the backend has
    /// accepted it.
    pub async fn post(&self, job_type: JobType, payload: JobPayload) -> Result<JobId> {
        let request = self.request(job_type, payload);
        self.backend.submit(&request).await?;
        Ok(request.job_id)
    }

    /// Poll a job until it goes idle, is not found, or is cancelled.
    /// The first poll happens immediately.
    pub fn monitor(
        &self,
        job_id: JobId,
        message: impl Into<String>,
        callbacks: MonitorCallbacks,
    ) -> MonitorHandle {
        let message = message.into();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(MonitorState::Running);

        let poller = Poller {
            backend: Arc::clone(&self.backend),
            job_id,
            message: message.clone(),
            interval: self.poll_interval,
            retries: self.not_found_retries,
            callbacks,
            cancel: cancel_rx,
            state: state_tx,
        };
        let task = tokio::spawn(poller.run());

        MonitorHandle {
            job_id,
            message,
            cancel: cancel_tx,
            state: state_rx,
            task,
        }
    }
}

struct Poller<B> {
    backend: Arc<B>,
    job_id: JobId,
    message: String,
    interval: Duration,
    retries: u32,
    callbacks: MonitorCallbacks,
    cancel: watch::Receiver<bool>,
    state: watch::Sender<MonitorState>,
}

impl<B: JobBackend> Poller<B> {
    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    fn finish(&self, state: MonitorState) {
        self.state.send_replace(state);
    }

    async fn run(mut self) -> Result<MonitorOutcome> {
        info!(job_id = %self.job_id, message = %self.message, "monitoring job");
        let mut polls = 0;
        let mut misses = 0;

        loop {
            if self.cancelled() {
                info!(job_id = %self.job_id, "monitoring cancelled");
                self.finish(MonitorState::Cancelled);
                return Err(DartboardError::Cancelled);
            }

            polls += 1;
            let status = self.backend.job_status(self.job_id).await;
            if self.cancelled() {
                continue;
            }

            match status {
                Ok(Some(JobStatus::Running)) => {
                    misses = 0;
                    debug!(job_id = %self.job_id, polls, "job running");
                    if let Some(on_update) = self.callbacks.on_update.as_mut() {
                        on_update();
                    }
                    self.report_page_status().await;
                }
                Ok(Some(JobStatus::Idle)) => {
                    info!(job_id = %self.job_id, polls, "job complete");
                    self.finish(MonitorState::Idle);
                    if let Some(on_complete) = self.callbacks.on_complete.take() {
                        on_complete();
                    }
                    return Ok(MonitorOutcome {
                        job_id: self.job_id,
                        polls,
                    });
                }
                Ok(None) | Err(_) => {
                    misses += 1;
                    if let Err(e) = &status {
                        warn!(job_id = %self.job_id, "status query failed: {}", e);
                    }
                    if misses >= self.retries {
                        error!(job_id = %self.job_id, attempts = misses, "job not found");
                        self.finish(MonitorState::Invalid);
                        return Err(DartboardError::JobNotFound {
                            job_id: self.job_id.as_i64(),
                            attempts: misses,
                        });
                    }
                    warn!(job_id = %self.job_id, attempt = misses, "job not found, retrying");
                }
            }

            self.pause().await;
        }
    }

    async fn report_page_status(&mut self) {
        let Some(on_status) = self.callbacks.on_status.as_mut() else {
            return;
        };
        match self.backend.page_status().await {
            Ok(status) => on_status(&self.message, &status),
            Err(e) => warn!(job_id = %self.job_id, "page status query failed: {}", e),
        }
    }

    /// Sleep one interval, waking early on cancellation.
    async fn pause(&mut self) {
        tokio::select! {
            _ = tokio::time::sleep(self.interval) => {}
            changed = self.cancel.changed() => {
                if changed.is_err() {
                    // Handle dropped; keep polling at the normal pace.
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}
