//! Pairwise similarity entries derived from raw records.

use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::AttributeIdentifiers;
use crate::view::format_subgroup_name;

use super::record::{RawRecord, OVERALL};

/// One pairwise comparison, reduced to what the level view needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityEntry {
    /// Attributes on which both subgroups agree, minus the excluded ones.
    pub shared_criteria: IndexMap<String, String>,
    /// Score per attribute and [`OVERALL`], each in `[0, 1]`.
    pub similarity: IndexMap<String, f64>,
    /// Attributes the similarity was computed over.
    pub similarity_attributes: Vec<String>,
    /// `shared_criteria.len()`.
    pub level: usize,
    /// Position of the source record in the full result list.
    pub raw_index: usize,
}

impl SimilarityEntry {
    /// Derive an entry from a raw record. Only attributes known to
    /// `identifiers` and absent from `excluded` can be shared.
    pub fn from_record(
        raw_index: usize,
        record: &RawRecord,
        excluded: &[String],
        identifiers: &AttributeIdentifiers,
    ) -> Self {
        let other = record.subgroup_2.criteria_text();
        let shared_criteria: IndexMap<String, String> = record
            .subgroup_1
            .criteria_text()
            .into_iter()
            .filter(|(attribute, value)| {
                identifiers.contains(attribute)
                    && !excluded.contains(attribute)
                    && other.get(attribute) == Some(value)
            })
            .collect();

        Self {
            level: shared_criteria.len(),
            shared_criteria,
            similarity: record.similarities(),
            similarity_attributes: record.similarity_attribute_set(),
            raw_index,
        }
    }

    /// Overall similarity, if reported.
    pub fn overall(&self) -> Option<f64> {
        self.similarity.get(OVERALL).copied()
    }

    /// The score used to rank and color the entry: overall when present,
    /// otherwise the mean of the per-attribute scores.
    pub fn headline_similarity(&self) -> Option<f64> {
        self.overall().or_else(|| {
            let scores: Vec<f64> = self.dimensions().map(|(_, v)| v).collect();
            (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64)
        })
    }

    /// Per-attribute scores, excluding the overall score.
    pub fn dimensions(&self) -> impl Iterator<Item = (&str, f64)> {
        self.similarity
            .iter()
            .filter(|(k, _)| k.as_str() != OVERALL)
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// True when an attribute defining the shared subgroup is also scored.
    /// Within the subgroup that attribute is constant, so its score is trivial.
    pub fn scores_shared_attribute(&self) -> bool {
        self.similarity_attributes
            .iter()
            .any(|a| self.shared_criteria.contains_key(a))
    }

    /// Attributes defining the shared subgroup.
    pub fn attribute_set(&self) -> Vec<&str> {
        self.shared_criteria.keys().map(String::as_str).collect()
    }

    /// Identifier-encoded attribute signature, e.g. `ta-tc`; empty for the
    /// overall (level 0) entry.
    pub fn group_key(&self, identifiers: &AttributeIdentifiers) -> String {
        let mut tokens: Vec<&str> = self
            .shared_criteria
            .keys()
            .map(|a| identifiers.encode(a).unwrap_or(a))
            .collect();
        tokens.sort_unstable();
        tokens.join("-")
    }

    /// Display name of the shared subgroup.
    pub fn name(&self) -> String {
        format_subgroup_name(&self.shared_criteria)
    }
}
