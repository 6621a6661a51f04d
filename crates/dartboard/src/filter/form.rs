//! Raw filter form input.
//!
//! The filter form submits bracketed keys:
//!
//! ```text
//! filters[<group>][<attribute>]=<checked value>            (categorical, repeated)
//! filters[<group>][<attribute>][lower-bound]=<number>      (numeric)
//! filters[<group>][<attribute>][lower-operator]=<op>
//! filters[<group>][<attribute>][upper-bound]=<number>
//! filters[<group>][<attribute>][upper-operator]=<op>
//! filters[<group>][<attribute>][join]=and|or
//! linked-filters=<attribute>                               (repeated)
//! remove-inherent=on
//! filters[linked][similarity_attributes]=<attribute>       (repeated)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::error::{DartboardError, Result};
use crate::schema::SIMILARITY_ATTRIBUTES_OPTION;

/// Group id of the first subgroup.
pub const GROUP_ONE: &str = "1";
/// Group id of the second subgroup.
pub const GROUP_TWO: &str = "2";
/// Pseudo-group for inputs applied identically to every real group.
pub const LINKED_GROUP: &str = "linked";

const LINKED_FILTERS_KEY: &str = "linked-filters";
const REMOVE_INHERENT_KEY: &str = "remove-inherent";

static FILTER_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^filters\[([^\[\]]+)\]\[([^\[\]]+)\](?:\[([^\[\]]+)\])?$").unwrap()
});

/// A parsed `filters[group][attribute][field]` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterKey {
    pub group: String,
    pub attribute: String,
    pub field: Option<String>,
}

impl FilterKey {
    /// Parse a form key; None if it is not a filter key.
    pub fn parse(key: &str) -> Option<Self> {
        FILTER_KEY_RE.captures(key).map(|caps| Self {
            group: caps[1].to_string(),
            attribute: caps[2].to_string(),
            field: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// Format the key for a (group, attribute, field) triple.
    pub fn format(group: &str, attribute: &str, field: Option<&str>) -> String {
        match field {
            Some(field) => format!("filters[{}][{}][{}]", group, attribute, field),
            None => format!("filters[{}][{}]", group, attribute),
        }
    }
}

/// Bound inputs for a numeric attribute, as entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericInput {
    pub lower_bound: Option<String>,
    pub lower_operator: Option<String>,
    pub upper_bound: Option<String>,
    pub upper_operator: Option<String>,
    pub join: Option<String>,
}

/// The input for one (group, attribute) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Checked categorical values (possibly none).
    Checked(Vec<String>),
    /// Numeric bound inputs.
    Bounds(NumericInput),
}

/// Ordered key/value pairs of a submitted filter form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    fields: Vec<(String, String)>,
}

impl FormState {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs in submission order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &str) -> Result<Self> {
        let mut url = Url::parse("form://local/")
            .map_err(|e| DartboardError::Parse(format!("Failed to prepare form parser: {}", e)))?;
        url.set_query(Some(body.trim().trim_start_matches('?')));
        Ok(Self {
            fields: url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        })
    }

    /// Encode back to `application/x-www-form-urlencoded`.
    pub fn to_urlencoded(&self) -> String {
        let mut url = match Url::parse("form://local/") {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        url.query_pairs_mut().extend_pairs(self.fields.iter());
        url.query().unwrap_or_default().to_string()
    }

    /// Append a key/value pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Builder-style [`FormState::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Replace every value of `key` with a single value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter().position(|(k, _)| k == key) {
            Some(first) => {
                self.fields[first].1 = value;
                let mut index = 0;
                self.fields.retain(|(k, _)| {
                    let keep = k != key || index == first;
                    index += 1;
                    keep
                });
            }
            None => self.fields.push((key.to_string(), value)),
        }
    }

    /// Remove all values of `key`.
    pub fn remove(&mut self, key: &str) {
        self.fields.retain(|(k, _)| k != key);
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values of `key` in submission order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All key/value pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn filter_keys(&self) -> impl Iterator<Item = FilterKey> + '_ {
        self.fields.iter().filter_map(|(k, _)| FilterKey::parse(k))
    }

    /// Real group ids mentioned by filter keys, in first-seen order.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for key in self.filter_keys() {
            if key.group != LINKED_GROUP && !groups.contains(&key.group) {
                groups.push(key.group);
            }
        }
        groups
    }

    /// Attributes mentioned by filter keys, in first-seen order, excluding
    /// the similarity attribute list.
    pub fn attributes(&self) -> Vec<String> {
        let mut attributes: Vec<String> = Vec::new();
        for key in self.filter_keys() {
            if key.attribute != SIMILARITY_ATTRIBUTES_OPTION && !attributes.contains(&key.attribute)
            {
                attributes.push(key.attribute);
            }
        }
        attributes
    }

    /// The input for one (group, attribute) pair, or None if the form has no
    /// keys for it.
    pub fn field(&self, group: &str, attribute: &str) -> Option<FieldInput> {
        let mut checked = Vec::new();
        let mut numeric = NumericInput::default();
        let mut is_numeric = false;
        let mut seen = false;

        for (k, v) in &self.fields {
            let Some(key) = FilterKey::parse(k) else {
                continue;
            };
            if key.group != group || key.attribute != attribute {
                continue;
            }
            seen = true;
            let value = v.trim();
            let entered = (!value.is_empty()).then(|| value.to_string());
            match key.field.as_deref() {
                None => checked.extend(entered),
                Some(field) => {
                    is_numeric = true;
                    match field {
                        "lower-bound" => numeric.lower_bound = entered,
                        "lower-operator" => numeric.lower_operator = entered,
                        "upper-bound" => numeric.upper_bound = entered,
                        "upper-operator" => numeric.upper_operator = entered,
                        "join" => numeric.join = entered,
                        other => tracing::debug!(field = other, attribute, "ignoring unknown filter field"),
                    }
                }
            }
        }

        if !seen {
            None
        } else if is_numeric {
            Some(FieldInput::Bounds(numeric))
        } else {
            Some(FieldInput::Checked(checked))
        }
    }

    /// Attributes whose filter is linked across groups.
    pub fn linked_attributes(&self) -> Vec<&str> {
        self.get_all(LINKED_FILTERS_KEY)
    }

    /// Mark an attribute as linked.
    pub fn link(&mut self, attribute: &str) {
        if !self.linked_attributes().contains(&attribute) {
            self.push(LINKED_FILTERS_KEY, attribute);
        }
    }

    /// Whether "ignore inherent attributes" is checked.
    pub fn remove_inherent(&self) -> bool {
        self.get(REMOVE_INHERENT_KEY)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "off" | "false" | "0"))
            .unwrap_or(false)
    }

    /// Set or clear "ignore inherent attributes".
    pub fn set_remove_inherent(&mut self, enabled: bool) {
        if enabled {
            self.set(REMOVE_INHERENT_KEY, "on");
        } else {
            self.remove(REMOVE_INHERENT_KEY);
        }
    }

    /// Attributes the user selected for the similarity calculation.
    pub fn similarity_attributes(&self) -> Vec<&str> {
        self.get_all(&FilterKey::format(
            LINKED_GROUP,
            SIMILARITY_ATTRIBUTES_OPTION,
            None,
        ))
    }
}
