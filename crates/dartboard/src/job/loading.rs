//! Dataset loading progress: backend steps reported by the loading-status
//! endpoint plus the client steps that build the session.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{DartboardError, Result};
use crate::schema::AttributeConfig;
use crate::session::Session;

use super::backend::JobBackend;

/// Client step: attribute configuration fetched and parsed.
pub const STORE_ATTRIBUTES_STEP: &str = "store-attributes";
/// Client step: color sets derived from the attribute configuration.
pub const CREATE_COLOR_SETS_STEP: &str = "create-color-sets";

/// Progress of one loading step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    NotStarted,
    Complete,
    Errored,
}

/// Status of every loading step, backend steps first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadingReport {
    steps: IndexMap<String, StepStatus>,
    checks: u32,
}

impl LoadingReport {
    pub fn new() -> Self {
        let mut report = Self::default();
        report.mark(STORE_ATTRIBUTES_STEP, StepStatus::NotStarted);
        report.mark(CREATE_COLOR_SETS_STEP, StepStatus::NotStarted);
        report
    }

    pub fn mark(&mut self, step: &str, status: StepStatus) {
        self.steps.insert(step.to_string(), status);
    }

    /// Merge a loading-status response; backend steps go before the
    /// client steps.
    fn merge_backend(&mut self, statuses: &IndexMap<String, bool>) {
        let client: Vec<(String, StepStatus)> = [STORE_ATTRIBUTES_STEP, CREATE_COLOR_SETS_STEP]
            .iter()
            .filter_map(|step| self.steps.shift_remove_entry(*step))
            .collect();
        for (step, done) in statuses {
            let status = if *done {
                StepStatus::Complete
            } else {
                StepStatus::NotStarted
            };
            self.steps.insert(step.clone(), status);
        }
        self.steps.extend(client);
    }

    pub fn steps(&self) -> &IndexMap<String, StepStatus> {
        &self.steps
    }

    pub fn status(&self, step: &str) -> Option<StepStatus> {
        self.steps.get(step).copied()
    }

    /// Loading-status polls issued.
    pub fn checks(&self) -> u32 {
        self.checks
    }

    /// Fraction of steps complete.
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let complete = self
            .steps
            .values()
            .filter(|s| **s == StepStatus::Complete)
            .count();
        complete as f64 / self.steps.len() as f64
    }

    pub fn is_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.values().all(|s| *s == StepStatus::Complete)
    }

    /// Loading finished without every step completing.
    pub fn is_errored(&self) -> bool {
        !self.is_complete()
    }

    /// Steps that need attention, for the details panel.
    pub fn troubleshooting(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|(step, status)| match status {
                StepStatus::Errored => Some(format!("{} failed", step)),
                StepStatus::NotStarted => Some(format!("{} did not run", step)),
                StepStatus::Complete => None,
            })
            .collect()
    }

    /// True once the backend has reported at least one step and all of its
    /// steps are done.
    fn backend_complete(&self) -> bool {
        let mut backend = self.steps.iter().filter(|(step, _)| !is_client_step(step)).peekable();
        backend.peek().is_some() && backend.all(|(_, status)| *status == StepStatus::Complete)
    }

    fn mark_backend_errored(&mut self) {
        for (step, status) in self.steps.iter_mut() {
            if !is_client_step(step) && *status != StepStatus::Complete {
                *status = StepStatus::Errored;
            }
        }
    }
}

fn is_client_step(step: &str) -> bool {
    step == STORE_ATTRIBUTES_STEP || step == CREATE_COLOR_SETS_STEP
}

/// Result of a dataset load: the report and the session when both client
/// steps succeeded.
#[derive(Debug)]
pub struct LoadOutcome {
    pub report: LoadingReport,
    pub session: Option<Session>,
}

/// Waits for the backend to finish loading, then builds the session.
pub struct LoadingMonitor<B> {
    backend: Arc<B>,
    interval: Duration,
    max_checks: u32,
}

impl<B: JobBackend> LoadingMonitor<B> {
    pub fn new(backend: Arc<B>, config: &DashboardConfig) -> Self {
        Self {
            backend,
            interval: config.poll_interval(),
            max_checks: config.loading_max_checks.max(1),
        }
    }

    pub fn with_max_checks(mut self, max_checks: u32) -> Self {
        self.max_checks = max_checks.max(1);
        self
    }

    /// Poll the loading-status endpoint until every backend step is done or
    /// the check budget runs out. Unfinished steps are then marked errored.
    pub async fn wait_for_backend(&self, report: &mut LoadingReport) -> Result<()> {
        loop {
            report.checks += 1;
            match self.backend.loading_status().await {
                Ok(statuses) => report.merge_backend(&statuses),
                Err(e) => warn!(check = report.checks, "loading status query failed: {}", e),
            }
            debug!(check = report.checks, progress = report.progress(), "loading status");

            if report.backend_complete() {
                return Ok(());
            }
            if report.checks >= self.max_checks {
                report.mark_backend_errored();
                warn!(checks = report.checks, "dataset loading timed out");
                return Err(DartboardError::Timeout {
                    task: "dataset loading".into(),
                    checks: report.checks,
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Full load: backend steps, then the client steps. Client steps still
    /// run after a backend timeout; their own failures are recorded in the
    /// report.
    pub async fn load(&self, config: DashboardConfig) -> LoadOutcome {
        let mut report = LoadingReport::new();
        if let Err(e) = self.wait_for_backend(&mut report).await {
            warn!("continuing after backend loading error: {}", e);
        }

        let attributes = match self.store_attributes().await {
            Ok(attributes) => {
                report.mark(STORE_ATTRIBUTES_STEP, StepStatus::Complete);
                attributes
            }
            Err(e) => {
                warn!("failed to load attribute configuration: {}", e);
                report.mark(STORE_ATTRIBUTES_STEP, StepStatus::Errored);
                return LoadOutcome {
                    report,
                    session: None,
                };
            }
        };

        let session = match Session::new(config, attributes) {
            Ok(session) => {
                report.mark(CREATE_COLOR_SETS_STEP, StepStatus::Complete);
                Some(session)
            }
            Err(e) => {
                warn!("failed to create color sets: {}", e);
                report.mark(CREATE_COLOR_SETS_STEP, StepStatus::Errored);
                None
            }
        };

        if report.is_complete() {
            info!(checks = report.checks, "dataset loaded");
        } else {
            warn!(failed = ?report.troubleshooting(), "dataset loaded with errors");
        }
        LoadOutcome { report, session }
    }

    async fn store_attributes(&self) -> Result<AttributeConfig> {
        let details = self.backend.attribute_config().await?;
        AttributeConfig::from_details(&details)
    }
}
