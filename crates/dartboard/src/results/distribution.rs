//! Attribute value distributions over subgroup members.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DartboardError, Result};
use crate::schema::scalar_text;

/// Values of one attribute by row index: a list, or an object keyed by the
/// index as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum IndexColumn {
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl IndexColumn {
    fn get(&self, index: usize) -> Option<&Value> {
        match self {
            IndexColumn::List(values) => values.get(index),
            IndexColumn::Map(values) => values.get(&index.to_string()),
        }
    }
}

/// Attribute -> row index -> value, as served by the index attributes
/// endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexValueTable {
    columns: IndexMap<String, IndexColumn>,
}

impl IndexValueTable {
    /// Decode the endpoint payload.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            DartboardError::DataShape(format!("Unexpected index attribute table: {}", e))
        })
    }

    /// Check whether the table has a column for an attribute.
    pub fn contains(&self, attribute: &str) -> bool {
        self.columns.contains_key(attribute)
    }

    /// Value of an attribute for a row, as text.
    pub fn value_at(&self, attribute: &str, index: usize) -> Option<String> {
        self.columns
            .get(attribute)
            .and_then(|c| c.get(index))
            .and_then(scalar_text)
    }

    /// Attributes with a column.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

/// Counts of one attribute's values within a subgroup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub attribute: String,
    /// Value -> count, in first-seen order.
    pub counts: IndexMap<String, usize>,
    /// Number of members with a value.
    pub total: usize,
}

impl Distribution {
    /// Count the values of `attribute` over the given row indices. Rows
    /// without a value are skipped.
    pub fn from_indices(attribute: &str, indices: &[usize], table: &IndexValueTable) -> Result<Self> {
        if !table.contains(attribute) {
            return Err(DartboardError::DataShape(format!(
                "No index values for attribute '{}'",
                attribute
            )));
        }
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut total = 0;
        for &index in indices {
            if let Some(value) = table.value_at(attribute, index) {
                *counts.entry(value).or_default() += 1;
                total += 1;
            }
        }
        Ok(Self {
            attribute: attribute.to_string(),
            counts,
            total,
        })
    }

    /// Share of members with `value`; 0 for an empty distribution.
    pub fn proportion(&self, value: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts.get(value).copied().unwrap_or(0) as f64 / self.total as f64
    }

    /// Value -> share, in first-seen order.
    pub fn proportions(&self) -> IndexMap<String, f64> {
        self.counts
            .keys()
            .map(|v| (v.clone(), self.proportion(v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_and_map_columns() {
        let table = IndexValueTable::from_value(json!({
            "region": ["east", "west", "east", null],
            "age": {"0": 30, "2": 41}
        }))
        .unwrap();
        assert_eq!(table.value_at("region", 1).as_deref(), Some("west"));
        assert_eq!(table.value_at("region", 3), None);
        assert_eq!(table.value_at("age", 2).as_deref(), Some("41"));
        assert_eq!(table.value_at("age", 1), None);
    }

    #[test]
    fn test_distribution_counts() {
        let table = IndexValueTable::from_value(json!({
            "region": ["east", "west", "east", null]
        }))
        .unwrap();
        let dist = Distribution::from_indices("region", &[0, 1, 2, 3], &table).unwrap();
        assert_eq!(dist.total, 3);
        assert_eq!(dist.counts.get("east"), Some(&2));
        assert!((dist.proportion("east") - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(dist.proportion("north"), 0.0);
    }

    #[test]
    fn test_missing_attribute() {
        let table = IndexValueTable::default();
        assert!(matches!(
            Distribution::from_indices("region", &[0], &table),
            Err(DartboardError::DataShape(_))
        ));
    }

    #[test]
    fn test_rejects_scalar_payload() {
        assert!(IndexValueTable::from_value(json!(5)).is_err());
    }
}
