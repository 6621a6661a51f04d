//! Per-attribute color sets for a session.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{DartboardError, Result};
use crate::schema::{AttributeConfig, AttributeValues};

use super::palette::{ColorMap, ColorSet};
use super::rgb::Rgb;

/// Color sets keyed by attribute name, rebuilt whenever the palette or the
/// attribute configuration changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorSetCache {
    palette: String,
    sets: IndexMap<String, ColorSet>,
}

impl ColorSetCache {
    /// Build a set for every configured attribute.
    pub fn build(attributes: &AttributeConfig, palette: &str) -> Result<Self> {
        let map = ColorMap::parse(palette)?;
        let mut sets = IndexMap::with_capacity(attributes.len());
        for descriptor in attributes.iter() {
            let set = match &descriptor.values {
                AttributeValues::Categories(_) => {
                    ColorSet::categorical(&map, &descriptor.category_values())
                }
                AttributeValues::Range(range) => {
                    ColorSet::Continuous(map.clone().with_domain(range.min, range.max))
                }
            };
            sets.insert(descriptor.name.clone(), set);
        }
        debug!(attributes = sets.len(), "built color sets");
        Ok(Self {
            palette: palette.to_string(),
            sets,
        })
    }

    /// Rebuild in place, e.g. after a palette change.
    pub fn rebuild(&mut self, attributes: &AttributeConfig, palette: &str) -> Result<()> {
        *self = Self::build(attributes, palette)?;
        Ok(())
    }

    /// The palette spec the sets were built from.
    pub fn palette(&self) -> &str {
        &self.palette
    }

    /// Color set of an attribute.
    pub fn get(&self, attribute: &str) -> Result<&ColorSet> {
        self.sets.get(attribute).ok_or_else(|| {
            DartboardError::DataShape(format!("No color set for attribute '{}'", attribute))
        })
    }

    /// Color of one attribute value; `Ok(None)` if the set has no color for it.
    pub fn color_for(&self, attribute: &str, value: &str) -> Result<Option<Rgb>> {
        Ok(self.get(attribute)?.color_for(value))
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
