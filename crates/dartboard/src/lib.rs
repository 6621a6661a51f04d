//! Dartboard: core of a subgroup similarity dashboard.
//!
//! Builds per-subgroup filters from form input, submits filter processing and
//! similarity jobs to an analysis backend, polls them to completion, and
//! organizes the returned pairwise similarity records into a level-based,
//! faceted browser with per-attribute distribution detail.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dartboard::{Dashboard, DashboardConfig, FormState, HttpBackend};
//!
//! # async fn run() -> dartboard::Result<()> {
//! let config = DashboardConfig::default().with_env_overrides();
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let (mut dashboard, _report) = Dashboard::load(config, backend).await?;
//!
//! let form = FormState::from_urlencoded("filters%5B1%5D%5Bsex%5D=F&filters%5B2%5D%5Bsex%5D=M")?;
//! let outcome = dashboard.compare(&form).await?;
//! println!("{} new entries", outcome.ingest.new_entries.len());
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod filter;
pub mod job;
pub mod results;
pub mod schema;
pub mod view;

mod dashboard;
mod session;

pub use color::{ColorMap, ColorSet, ColorSetCache, Foreground, Rgb};
pub use config::DashboardConfig;
pub use dashboard::{CompareOutcome, Dashboard, StatusSink, FILTER_MESSAGE, SIMILARITY_MESSAGE};
pub use error::{DartboardError, Result};
pub use filter::{FilterModel, FilterSet, FormState, Predicate};
pub use job::{HttpBackend, JobBackend, JobMonitor, MockBackend, MonitorHandle};
pub use results::{RawRecord, SimilarityEntry, SimilarityResultStore};
pub use schema::{AttributeConfig, AttributeDescriptor, AttributeIdentifiers};
pub use session::Session;
pub use view::{DetailPanel, FacetState, LevelFilterView};
