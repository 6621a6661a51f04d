//! Core type definitions for attribute descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a dataset attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Discrete values, filtered by checkbox.
    Categorical,
    /// Continuous values, filtered by lower/upper bounds.
    Numeric,
}

impl AttributeKind {
    /// Returns true if this kind is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttributeKind::Numeric)
    }
}

/// A single categorical value with its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryValue {
    pub value: String,
    pub display_name: String,
}

impl CategoryValue {
    /// Create a value whose display name is the value itself.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            display_name: value.clone(),
            value,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// Bounds for a numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Upper bound on the number of values a range expands into.
pub const MAX_RANGE_VALUES: usize = 100_000;

impl NumericRange {
    /// Check whether a value lies inside the range (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Values from `min` to `max` inclusive, `step` apart (1 when unset),
    /// paired with their text. At most [`MAX_RANGE_VALUES`] are produced.
    pub fn values(&self) -> Vec<(f64, String)> {
        if !(self.max >= self.min) {
            return Vec::new();
        }
        let step = self.step.filter(|s| *s > 0.0).unwrap_or(1.0);
        let count = (((self.max - self.min) / step + 1e-9).floor() as usize).min(MAX_RANGE_VALUES - 1);
        (0..=count)
            .map(|k| {
                let value = ((self.min + k as f64 * step) * 1e9).round() / 1e9;
                (value, number_text(value))
            })
            .collect()
    }
}

/// Text of a number the way JSON renders it: integers without a fraction.
pub fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// The value domain of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValues {
    /// Ordered list of categories.
    Categories(Vec<CategoryValue>),
    /// Numeric bounds.
    Range(NumericRange),
}

impl AttributeValues {
    /// The ordered category values, or an empty slice for numeric ranges.
    pub fn categories(&self) -> &[CategoryValue] {
        match self {
            AttributeValues::Categories(values) => values,
            AttributeValues::Range(_) => &[],
        }
    }
}

/// Render a JSON scalar the way it is displayed and compared as a
/// criterion value. Returns None for null, arrays and objects.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
