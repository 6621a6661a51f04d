//! Dashboard configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DartboardError, Result};
use crate::view::BarChartConfig;

/// Environment variable overriding [`DashboardConfig::base_url`].
pub const BASE_URL_ENV: &str = "DARTBOARD_URL";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Configuration for a dashboard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend root URL.
    pub base_url: String,
    /// Page identifier sent with every job.
    pub page_name: String,
    /// Delay between job status polls.
    pub poll_interval_ms: u64,
    /// Polls allowed to come back without a record before giving up.
    pub not_found_retries: u32,
    /// HTTP client timeout.
    pub request_timeout_secs: u64,
    /// Loading-status polls allowed before the load is marked errored.
    pub loading_max_checks: u32,
    /// Decimal places shown for similarity values.
    pub decimal_places: u32,
    /// Palette spec for similarity magnitudes.
    pub continuous_palette: String,
    /// Palette spec for category colors.
    pub categorical_palette: String,
    /// Distribution chart layout.
    pub chart: BarChartConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_name: "/database/compare".to_string(),
            poll_interval_ms: 1000,
            not_found_retries: 5,
            request_timeout_secs: 30,
            loading_max_checks: 100,
            decimal_places: 3,
            continuous_palette: "#b2182b, #f7f7f7, #2166ac".to_string(),
            categorical_palette: "#d7191c, #fdae61, #a6d96a, #1a9641, #2b83ba".to_string(),
            chart: BarChartConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DartboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            DartboardError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(DartboardError::Config("base_url must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(DartboardError::Config("poll_interval_ms must be positive".into()));
        }
        if self.loading_max_checks == 0 {
            return Err(DartboardError::Config("loading_max_checks must be positive".into()));
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_name(mut self, page_name: impl Into<String>) -> Self {
        self.page_name = page_name.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = places;
        self
    }

    pub fn with_categorical_palette(mut self, spec: impl Into<String>) -> Self {
        self.categorical_palette = spec.into();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL of a backend path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.not_found_retries, 5);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_ms": 250, "decimal_places": 2}}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.decimal_places, 2);
        assert_eq!(config.page_name, "/database/compare");
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            DashboardConfig::from_file("/nonexistent/dartboard.json"),
            Err(DartboardError::Io { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"poll_interval_ms": 0}}"#).unwrap();
        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(DartboardError::Config(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let config = DashboardConfig::default().with_overrides_from(|key| {
            (key == BASE_URL_ENV).then(|| "http://backend:8080/".to_string())
        });
        assert_eq!(config.base_url, "http://backend:8080/");
        assert_eq!(config.endpoint("/job-status"), "http://backend:8080/job-status");
    }
}
