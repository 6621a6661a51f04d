//! Wire records returned by the comparison results endpoint.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::scalar_text;

/// Key of the overall similarity score.
pub const OVERALL: &str = "overall";
/// Older records carry a single score under this key.
const SIMILARITY_KEY: &str = "similarity";

/// One side of a pairwise comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSubgroup {
    /// Attribute -> value criteria defining the subgroup.
    #[serde(default)]
    pub criteria: IndexMap<String, Value>,
    /// Criteria added on top of the submitted filters, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_criteria: Option<IndexMap<String, Value>>,
    #[serde(default)]
    pub size: Option<u64>,
    /// Row indices of the subgroup members.
    #[serde(default)]
    pub indices: Vec<usize>,
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RawSubgroup {
    /// Non-null criteria as text.
    pub fn criteria_text(&self) -> IndexMap<String, String> {
        self.criteria
            .iter()
            .filter_map(|(k, v)| scalar_text(v).map(|text| (k.clone(), text)))
            .collect()
    }
}

/// One pairwise similarity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Subgroup 1")]
    pub subgroup_1: RawSubgroup,
    #[serde(rename = "Subgroup 2")]
    pub subgroup_2: RawSubgroup,
    /// Number of rows in both subgroups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<u64>,
    /// Attributes the similarity was computed over, when listed explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_attributes: Option<Vec<String>>,
    /// Per-attribute and overall scores, plus anything else the backend adds.
    #[serde(flatten)]
    pub scores: IndexMap<String, Value>,
}

impl RawRecord {
    /// Numeric scores keyed by attribute or [`OVERALL`]. A bare
    /// `similarity` score is reported as the overall score.
    pub fn similarities(&self) -> IndexMap<String, f64> {
        let mut similarities = IndexMap::new();
        for (key, value) in &self.scores {
            let Some(score) = value.as_f64() else {
                continue;
            };
            let key = if key == SIMILARITY_KEY { OVERALL } else { key.as_str() };
            similarities.entry(key.to_string()).or_insert(score);
        }
        similarities
    }

    /// Attributes the similarity covers.
    pub fn similarity_attribute_set(&self) -> Vec<String> {
        match &self.similarity_attributes {
            Some(attributes) => attributes.clone(),
            None => self
                .similarities()
                .into_keys()
                .filter(|k| k != OVERALL)
                .collect(),
        }
    }

    /// True unless both sides report added criteria and they differ. Such a
    /// pair compares subgroups that are not the same refinement of the
    /// submitted filters.
    pub fn added_criteria_match(&self) -> bool {
        match (&self.subgroup_1.added_criteria, &self.subgroup_2.added_criteria) {
            (Some(first), Some(second)) => first == second,
            _ => true,
        }
    }

    /// Subgroup by its 1-based position.
    pub fn subgroup(&self, which: usize) -> Option<&RawSubgroup> {
        match which {
            1 => Some(&self.subgroup_1),
            2 => Some(&self.subgroup_2),
            _ => None,
        }
    }
}
