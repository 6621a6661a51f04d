//! Session context shared by every component.

use tracing::info;

use crate::color::{ColorMap, ColorSetCache, Foreground, Rgb};
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::filter::{FilterModel, FilterSection};
use crate::job::JobBackend;
use crate::schema::{AttributeConfig, AttributeIdentifiers};
use crate::view::format_score;

/// Everything loaded once per session: configuration, attribute
/// descriptors, identifier tokens and derived color sets.
///
/// Owned by the caller and passed by reference; rebuilding a palette or the
/// attribute configuration refreshes the derived state in place.
#[derive(Debug, Clone)]
pub struct Session {
    config: DashboardConfig,
    attributes: AttributeConfig,
    identifiers: AttributeIdentifiers,
    colors: ColorSetCache,
    similarity_map: ColorMap,
}

impl Session {
    /// Build a session from loaded attributes.
    pub fn new(config: DashboardConfig, attributes: AttributeConfig) -> Result<Self> {
        let identifiers = AttributeIdentifiers::generate(attributes.names());
        let colors = ColorSetCache::build(&attributes, &config.categorical_palette)?;
        let similarity_map = ColorMap::parse(&config.continuous_palette)?;
        Ok(Self {
            config,
            attributes,
            identifiers,
            colors,
            similarity_map,
        })
    }

    /// Fetch the attribute configuration from the backend and build a
    /// session around it.
    pub async fn bootstrap<B: JobBackend>(config: DashboardConfig, backend: &B) -> Result<Self> {
        let details = backend.attribute_config().await?;
        let attributes = AttributeConfig::from_details(&details)?;
        info!(attributes = attributes.len(), "session bootstrapped");
        Self::new(config, attributes)
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn attributes(&self) -> &AttributeConfig {
        &self.attributes
    }

    pub fn identifiers(&self) -> &AttributeIdentifiers {
        &self.identifiers
    }

    pub fn colors(&self) -> &ColorSetCache {
        &self.colors
    }

    /// Color map for similarity magnitudes.
    pub fn similarity_map(&self) -> &ColorMap {
        &self.similarity_map
    }

    pub fn decimal_places(&self) -> u32 {
        self.config.decimal_places
    }

    /// Filter model bound to this session's attributes.
    pub fn filter_model(&self) -> FilterModel<'_> {
        FilterModel::new(&self.attributes)
    }

    /// Fresh filter section state for this session's attributes.
    pub fn filter_section(&self) -> FilterSection {
        FilterSection::new(&self.attributes)
    }

    /// Replace the attribute configuration, regenerating identifiers and
    /// color sets.
    pub fn set_attributes(&mut self, attributes: AttributeConfig) -> Result<()> {
        let colors = ColorSetCache::build(&attributes, &self.config.categorical_palette)?;
        self.identifiers = AttributeIdentifiers::generate(attributes.names());
        self.colors = colors;
        self.attributes = attributes;
        Ok(())
    }

    /// Switch the category palette and rebuild every color set.
    pub fn set_categorical_palette(&mut self, spec: &str) -> Result<()> {
        self.colors.rebuild(&self.attributes, spec)?;
        self.config.categorical_palette = spec.to_string();
        Ok(())
    }

    /// Switch the similarity palette.
    pub fn set_continuous_palette(&mut self, spec: &str) -> Result<()> {
        self.similarity_map = ColorMap::parse(spec)?;
        self.config.continuous_palette = spec.to_string();
        Ok(())
    }

    pub fn set_decimal_places(&mut self, places: u32) {
        self.config.decimal_places = places;
    }

    /// Background and legible foreground for a similarity value.
    pub fn similarity_color(&self, value: f64) -> (Rgb, Foreground) {
        let color = self.similarity_map.get_color(value);
        (color, color.foreground())
    }

    /// Similarity value at the session's precision.
    pub fn format_score(&self, value: f64) -> String {
        format_score(value, self.config.decimal_places)
    }
}
