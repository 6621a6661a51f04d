//! Facet selections for the results browser.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DartboardError, Result};
use crate::results::SimilarityEntry;

/// A checkbox facet group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacetGroup {
    /// Values of one shared attribute.
    Attribute(String),
    /// The attributes similarity was computed over.
    SimilarityAttributes,
}

/// Level, attribute-value and similarity-attribute selections.
///
/// Options are created checked when first seen. The level facet is a single
/// choice, defaulting to the first level encountered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacetState {
    levels: Vec<usize>,
    selected_level: Option<usize>,
    attribute_values: IndexMap<String, IndexMap<String, bool>>,
    similarity_attributes: IndexMap<String, bool>,
}

impl FacetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level option. Returns true if the level is new.
    pub fn register_level(&mut self, level: usize) -> bool {
        if self.levels.contains(&level) {
            return false;
        }
        self.levels.push(level);
        if self.selected_level.is_none() {
            self.selected_level = Some(level);
        }
        true
    }

    /// Add options for an entry's shared values and similarity attributes.
    pub fn register_entry(&mut self, entry: &SimilarityEntry) {
        for (attribute, value) in &entry.shared_criteria {
            self.attribute_values
                .entry(attribute.clone())
                .or_default()
                .entry(value.clone())
                .or_insert(true);
        }
        for attribute in &entry.similarity_attributes {
            self.similarity_attributes
                .entry(attribute.clone())
                .or_insert(true);
        }
    }

    /// Levels in the order first seen.
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Levels in ascending order, for display.
    pub fn sorted_levels(&self) -> Vec<usize> {
        let mut levels = self.levels.clone();
        levels.sort_unstable();
        levels
    }

    pub fn selected_level(&self) -> Option<usize> {
        self.selected_level
    }

    /// Select a known level.
    pub fn select_level(&mut self, level: usize) -> Result<()> {
        if !self.levels.contains(&level) {
            return Err(DartboardError::Validation(format!("Level {} has no results", level)));
        }
        self.selected_level = Some(level);
        Ok(())
    }

    /// Attribute -> value -> checked.
    pub fn attribute_values(&self) -> &IndexMap<String, IndexMap<String, bool>> {
        &self.attribute_values
    }

    /// Similarity attribute -> checked.
    pub fn similarity_attributes(&self) -> &IndexMap<String, bool> {
        &self.similarity_attributes
    }

    /// Whether a similarity attribute is checked; unknown attributes count
    /// as checked.
    pub fn is_similarity_attribute_checked(&self, attribute: &str) -> bool {
        self.similarity_attributes.get(attribute).copied().unwrap_or(true)
    }

    fn options_mut(&mut self, group: &FacetGroup) -> Result<&mut IndexMap<String, bool>> {
        match group {
            FacetGroup::Attribute(attribute) => {
                self.attribute_values.get_mut(attribute).ok_or_else(|| {
                    DartboardError::DataShape(format!("No facet for attribute '{}'", attribute))
                })
            }
            FacetGroup::SimilarityAttributes => Ok(&mut self.similarity_attributes),
        }
    }

    /// Set one option. Unknown options are an error.
    pub fn set(&mut self, group: &FacetGroup, option: &str, checked: bool) -> Result<()> {
        let slot = self.options_mut(group)?.get_mut(option).ok_or_else(|| {
            DartboardError::DataShape(format!("No facet option '{}' in {:?}", option, group))
        })?;
        *slot = checked;
        Ok(())
    }

    /// Flip one option and return its new state.
    pub fn toggle(&mut self, group: &FacetGroup, option: &str) -> Result<bool> {
        let slot = self.options_mut(group)?.get_mut(option).ok_or_else(|| {
            DartboardError::DataShape(format!("No facet option '{}' in {:?}", option, group))
        })?;
        *slot = !*slot;
        Ok(*slot)
    }

    /// Check every option of a group.
    pub fn select_all(&mut self, group: &FacetGroup) -> Result<()> {
        self.options_mut(group)?.values_mut().for_each(|v| *v = true);
        Ok(())
    }

    /// Uncheck every option of a group.
    pub fn select_none(&mut self, group: &FacetGroup) -> Result<()> {
        self.options_mut(group)?.values_mut().for_each(|v| *v = false);
        Ok(())
    }

    /// An entry is visible when its level is the selected one and it
    /// passes [`FacetState::matches_options`].
    pub fn is_visible(&self, entry: &SimilarityEntry) -> bool {
        self.selected_level == Some(entry.level) && self.matches_options(entry)
    }

    /// True when none of the entry's shared values and none of its
    /// similarity attributes is unchecked.
    pub fn matches_options(&self, entry: &SimilarityEntry) -> bool {
        let value_hidden = entry.shared_criteria.iter().any(|(attribute, value)| {
            self.attribute_values
                .get(attribute)
                .and_then(|options| options.get(value))
                .is_some_and(|checked| !checked)
        });
        if value_hidden {
            return false;
        }
        !entry
            .similarity_attributes
            .iter()
            .any(|a| self.similarity_attributes.get(a).is_some_and(|checked| !checked))
    }

    /// Drop all options, e.g. before a new comparison.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn entry(level_values: &[(&str, &str)], similarity: &[&str]) -> SimilarityEntry {
        let shared: IndexMap<String, String> = level_values
            .iter()
            .map(|(a, v)| (a.to_string(), v.to_string()))
            .collect();
        SimilarityEntry {
            level: shared.len(),
            shared_criteria: shared,
            similarity: IndexMap::new(),
            similarity_attributes: similarity.iter().map(|s| s.to_string()).collect(),
            raw_index: 0,
        }
    }

    #[test]
    fn test_first_level_is_default() {
        let mut facets = FacetState::new();
        assert!(facets.register_level(2));
        assert!(facets.register_level(1));
        assert!(!facets.register_level(2));
        assert_eq!(facets.selected_level(), Some(2));
        assert_eq!(facets.sorted_levels(), vec![1, 2]);
        assert!(facets.select_level(5).is_err());
    }

    #[test]
    fn test_unchecked_value_hides_entry() {
        let east = entry(&[("region", "east")], &["sex"]);
        let west = entry(&[("region", "west")], &["sex"]);
        let mut facets = FacetState::new();
        facets.register_level(1);
        facets.register_entry(&east);
        facets.register_entry(&west);

        let region = FacetGroup::Attribute("region".into());
        assert!(!facets.toggle(&region, "east").unwrap());
        assert!(!facets.is_visible(&east));
        assert!(facets.is_visible(&west));

        facets.select_all(&region).unwrap();
        assert!(facets.is_visible(&east));
    }

    #[test]
    fn test_unchecked_similarity_attribute_hides_entry() {
        let a = entry(&[], &["sex", "age"]);
        let b = entry(&[], &["age"]);
        let mut facets = FacetState::new();
        facets.register_level(0);
        facets.register_entry(&a);
        facets.register_entry(&b);

        facets
            .set(&FacetGroup::SimilarityAttributes, "sex", false)
            .unwrap();
        assert!(!facets.is_visible(&a));
        assert!(facets.is_visible(&b));

        facets.select_none(&FacetGroup::SimilarityAttributes).unwrap();
        assert!(!facets.is_visible(&b));
    }

    #[test]
    fn test_unknown_options() {
        let mut facets = FacetState::new();
        let region = FacetGroup::Attribute("region".into());
        assert!(facets.toggle(&region, "east").is_err());
        assert!(facets
            .set(&FacetGroup::SimilarityAttributes, "sex", true)
            .is_err());
    }
}
