//! Attribute descriptors and the per-session attribute configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DartboardError, Result};

use super::types::{scalar_text, AttributeKind, AttributeValues, CategoryValue, NumericRange};

/// Filter option for subgroup size (numeric, never inherent).
pub const SIZE_OPTION: &str = "size";
/// Filter option for the number of attributes defining a subgroup.
pub const N_ATTRIBUTES_OPTION: &str = "n_attributes";
/// Filter option listing the attributes used to compute similarity.
pub const SIMILARITY_ATTRIBUTES_OPTION: &str = "similarity_attributes";

/// Returns true for the filter options that are not dataset attributes.
pub fn is_auxiliary(name: &str) -> bool {
    matches!(
        name,
        SIZE_OPTION | N_ATTRIBUTES_OPTION | SIMILARITY_ATTRIBUTES_OPTION
    )
}

/// Description of a single dataset attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Unique attribute name.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// Categorical or numeric.
    pub kind: AttributeKind,
    /// Value domain.
    pub values: AttributeValues,
}

impl AttributeDescriptor {
    /// Create a categorical attribute from its ordered values.
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind: AttributeKind::Categorical,
            values: AttributeValues::Categories(
                values.into_iter().map(CategoryValue::new).collect(),
            ),
        }
    }

    /// Create a numeric attribute.
    pub fn numeric(name: impl Into<String>, min: f64, max: f64, step: Option<f64>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind: AttributeKind::Numeric,
            values: AttributeValues::Range(NumericRange { min, max, step }),
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Ordered category values (empty for numeric attributes).
    pub fn category_values(&self) -> Vec<&str> {
        self.values
            .categories()
            .iter()
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Concrete values a numeric filter can select: the listed values that
    /// parse as numbers, or the steps of the range.
    pub fn numeric_values(&self) -> Vec<(f64, String)> {
        match &self.values {
            AttributeValues::Categories(values) => values
                .iter()
                .filter_map(|c| c.value.trim().parse::<f64>().ok().map(|n| (n, c.value.clone())))
                .collect(),
            AttributeValues::Range(range) => range.values(),
        }
    }

    /// Display name for one of this attribute's values.
    pub fn value_display_name<'a>(&'a self, value: &'a str) -> &'a str {
        self.values
            .categories()
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.display_name.as_str())
            .unwrap_or(value)
    }

    /// Parse one `[name, kind, values]` triple from the dataset details
    /// endpoint.
    pub fn from_triple(triple: &Value) -> Result<Self> {
        let parts = triple
            .as_array()
            .filter(|parts| parts.len() >= 3)
            .ok_or_else(|| {
                DartboardError::DataShape(format!(
                    "Expected [name, kind, values] triple, got {}",
                    triple
                ))
            })?;

        let name = parts[0]
            .as_str()
            .ok_or_else(|| DartboardError::DataShape("Attribute name must be a string".into()))?;
        let kind: AttributeKind = serde_json::from_value(parts[1].clone()).map_err(|_| {
            DartboardError::DataShape(format!(
                "Unknown kind {} for attribute '{}'",
                parts[1], name
            ))
        })?;

        let values = match (&parts[2], kind) {
            (Value::Array(items), _) => {
                let mut categories = Vec::with_capacity(items.len());
                for item in items {
                    categories.push(parse_category(name, item)?);
                }
                AttributeValues::Categories(categories)
            }
            (Value::Object(_), AttributeKind::Numeric) => {
                let range: NumericRange = serde_json::from_value(parts[2].clone())?;
                AttributeValues::Range(range)
            }
            (other, _) => {
                return Err(DartboardError::DataShape(format!(
                    "Unsupported values {} for attribute '{}'",
                    other, name
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            display_name: name.to_string(),
            kind,
            values,
        })
    }
}

fn parse_category(attribute: &str, item: &Value) -> Result<CategoryValue> {
    if let Some(text) = scalar_text(item) {
        return Ok(CategoryValue::new(text));
    }
    if let Value::Object(map) = item {
        if let Some(value) = map.get("value").and_then(scalar_text) {
            let display = map
                .get("display_name")
                .or_else(|| map.get("displayName"))
                .and_then(scalar_text)
                .unwrap_or_else(|| value.clone());
            return Ok(CategoryValue::new(value).with_display_name(display));
        }
    }
    Err(DartboardError::DataShape(format!(
        "Unsupported value {} for attribute '{}'",
        item, attribute
    )))
}

/// Ordered, name-keyed set of attribute descriptors loaded once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeConfig {
    attributes: IndexMap<String, AttributeDescriptor>,
}

impl AttributeConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from descriptors. Names must be unique.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = AttributeDescriptor>) -> Result<Self> {
        let mut attributes = IndexMap::new();
        for descriptor in descriptors {
            if is_auxiliary(&descriptor.name) {
                return Err(DartboardError::DataShape(format!(
                    "Attribute name '{}' is reserved for a filter option",
                    descriptor.name
                )));
            }
            if attributes.contains_key(&descriptor.name) {
                return Err(DartboardError::DataShape(format!(
                    "Duplicate attribute '{}'",
                    descriptor.name
                )));
            }
            attributes.insert(descriptor.name.clone(), descriptor);
        }
        Ok(Self { attributes })
    }

    /// Build from the dataset details payload: either
    /// `{"attributes": [[name, kind, values], ...]}` or the bare list.
    pub fn from_details(details: &Value) -> Result<Self> {
        let triples = details
            .get("attributes")
            .unwrap_or(details)
            .as_array()
            .ok_or_else(|| {
                DartboardError::DataShape("Dataset details carry no attribute list".into())
            })?;

        let descriptors = triples
            .iter()
            .map(AttributeDescriptor::from_triple)
            .collect::<Result<Vec<_>>>()?;
        Self::from_descriptors(descriptors)
    }

    /// Look up an attribute, reporting a data shape error if it is unknown.
    pub fn get(&self, name: &str) -> Result<&AttributeDescriptor> {
        self.attributes.get(name).ok_or_else(|| {
            DartboardError::DataShape(format!("No configuration for attribute '{}'", name))
        })
    }

    /// Check whether an attribute is known.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute names in dataset order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Descriptors in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.values()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Display name of an attribute, falling back to the name itself.
    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.attributes
            .get(name)
            .map(|d| d.display_name.as_str())
            .unwrap_or(name)
    }

    /// Descriptors for the non-attribute filter options.
    pub fn auxiliary_descriptors(&self) -> Vec<AttributeDescriptor> {
        let max_attributes = self.len().saturating_sub(1) as f64;
        let similarity = AttributeDescriptor {
            name: SIMILARITY_ATTRIBUTES_OPTION.to_string(),
            display_name: "Similarity Attributes".to_string(),
            kind: AttributeKind::Categorical,
            values: AttributeValues::Categories(
                self.iter()
                    .map(|d| CategoryValue::new(&d.name).with_display_name(&d.display_name))
                    .collect(),
            ),
        };
        vec![
            AttributeDescriptor::numeric(SIZE_OPTION, 0.0, f64::INFINITY, None)
                .with_display_name("Subgroup Size"),
            AttributeDescriptor::numeric(N_ATTRIBUTES_OPTION, 1.0, max_attributes, Some(1.0))
                .with_display_name("Number of Attributes"),
            similarity,
        ]
    }
}
