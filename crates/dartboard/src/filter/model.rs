//! Filter construction from form input.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DartboardError, Result};
use crate::schema::{is_auxiliary, AttributeConfig, AttributeKind, N_ATTRIBUTES_OPTION, SIZE_OPTION};

use super::form::{FieldInput, FilterKey, FormState, NumericInput, GROUP_ONE, GROUP_TWO, LINKED_GROUP};
use super::predicate::{Bound, Comparison, JoinOp, Predicate};

/// Message shown when a comparison is submitted with an unconstrained subgroup.
pub const EMPTY_SUBGROUP_MESSAGE: &str =
    "Subgroup 1 and Subgroup 2 must each have at least one filter applied";

/// Builds structured filters from a [`FormState`] against the session's
/// attribute configuration.
#[derive(Debug, Clone, Copy)]
pub struct FilterModel<'a> {
    attributes: &'a AttributeConfig,
}

impl<'a> FilterModel<'a> {
    pub fn new(attributes: &'a AttributeConfig) -> Self {
        Self { attributes }
    }

    fn kind_of(&self, attribute: &str) -> Result<AttributeKind> {
        match attribute {
            SIZE_OPTION | N_ATTRIBUTES_OPTION => Ok(AttributeKind::Numeric),
            _ => Ok(self.attributes.get(attribute)?.kind),
        }
    }

    /// Build the expression for one (group, attribute) pair. `None` means the
    /// attribute is unconstrained for that group.
    pub fn build_filter_expression(
        &self,
        group: &str,
        attribute: &str,
        form: &FormState,
    ) -> Result<Option<Predicate>> {
        let kind = self.kind_of(attribute)?;
        let Some(input) = form.field(group, attribute) else {
            return Ok(None);
        };

        match (kind, input) {
            (AttributeKind::Categorical, FieldInput::Checked(values)) => {
                Ok(Predicate::any_of(attribute, values))
            }
            (AttributeKind::Numeric, FieldInput::Bounds(input)) => numeric_expression(attribute, &input),
            // A numeric attribute with no bound fields submitted at all.
            (AttributeKind::Numeric, FieldInput::Checked(values)) if values.is_empty() => Ok(None),
            (kind, _) => Err(DartboardError::DataShape(format!(
                "Form input for '{}' in group {} does not match its {:?} kind",
                attribute, group, kind
            ))),
        }
    }

    /// Convert the whole form into a [`FilterSet`].
    ///
    /// Linked attributes are computed once under the `linked` pseudo-group
    /// and copied into every real group. Attributes without a configuration
    /// are logged and skipped.
    pub fn process_filters(&self, form: &FormState) -> Result<FilterSet> {
        let mut groups: IndexMap<String, Vec<Predicate>> = IndexMap::new();
        for group in [GROUP_ONE, GROUP_TWO]
            .into_iter()
            .map(str::to_string)
            .chain(form.groups())
        {
            groups.entry(group).or_default();
        }
        let group_ids: Vec<String> = groups.keys().cloned().collect();
        let linked = form.linked_attributes();
        let mut active: IndexSet<String> = IndexSet::new();

        for attribute in form.attributes() {
            if !is_auxiliary(&attribute) && !self.attributes.contains(&attribute) {
                warn!(attribute = %attribute, "skipping filter for unconfigured attribute");
                continue;
            }

            if linked.contains(&attribute.as_str()) {
                if let Some(expression) = self.build_filter_expression(LINKED_GROUP, &attribute, form)? {
                    for predicates in groups.values_mut() {
                        predicates.push(expression.clone());
                    }
                    if !is_auxiliary(&attribute) {
                        active.insert(attribute.clone());
                    }
                }
            } else {
                for group in &group_ids {
                    if let Some(expression) = self.build_filter_expression(group, &attribute, form)? {
                        if let Some(predicates) = groups.get_mut(group) {
                            predicates.push(expression);
                        }
                        if !is_auxiliary(&attribute) {
                            active.insert(attribute.clone());
                        }
                    }
                }
            }
        }

        let remove_inherent = form.remove_inherent();
        let similarity_attributes = form
            .similarity_attributes()
            .into_iter()
            .filter(|a| !(remove_inherent && active.contains(*a)))
            .map(str::to_string)
            .collect();

        let set = FilterSet {
            groups,
            remove_inherent,
            similarity_attributes,
            active_attributes: active.into_iter().collect(),
        };
        debug!(
            groups = set.groups.len(),
            active = ?set.active_attributes,
            "processed filter form"
        );
        Ok(set)
    }
}

fn numeric_expression(attribute: &str, input: &NumericInput) -> Result<Option<Predicate>> {
    let lower = bound(attribute, "lower", &input.lower_bound, &input.lower_operator)?;
    let upper = bound(attribute, "upper", &input.upper_bound, &input.upper_operator)?;
    let join = match input.join.as_deref() {
        Some(join) => JoinOp::parse(join)?,
        None => JoinOp::default(),
    };
    Ok(Predicate::range(attribute, lower, upper, join))
}

fn bound(
    attribute: &str,
    side: &str,
    value: &Option<String>,
    operator: &Option<String>,
) -> Result<Option<Bound>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if value.parse::<f64>().is_err() {
        return Err(DartboardError::Validation(format!(
            "The {} bound for '{}' must be a number, got '{}'",
            side, attribute, value
        )));
    }
    let operator = operator.as_deref().ok_or_else(|| {
        DartboardError::Parse(format!("Missing {} operator for '{}'", side, attribute))
    })?;
    let op = Comparison::parse(operator)?;
    if op == Comparison::Eq {
        return Err(DartboardError::Parse(format!(
            "The {} bound for '{}' needs an ordering operator",
            side, attribute
        )));
    }
    Ok(Some(Bound::new(op, value.clone())))
}

/// Per-group filter predicates plus the similarity options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    /// Predicates per real group id, in form order.
    pub groups: IndexMap<String, Vec<Predicate>>,
    /// Whether attributes defining a subgroup are excluded from similarity.
    pub remove_inherent: bool,
    /// Attributes to compute similarity over.
    pub similarity_attributes: Vec<String>,
    /// Dataset attributes that produced at least one predicate.
    pub active_attributes: Vec<String>,
}

impl FilterSet {
    /// Predicates for a group (empty if the group is unknown).
    pub fn group(&self, id: &str) -> &[Predicate] {
        self.groups.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// A comparison needs at least one predicate in each subgroup.
    pub fn validate_for_comparison(&self) -> Result<()> {
        if self.group(GROUP_ONE).is_empty() || self.group(GROUP_TWO).is_empty() {
            return Err(DartboardError::Validation(EMPTY_SUBGROUP_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Attributes already used to define a subgroup. Shared criteria never
    /// include these, and similarity attributes drop them when
    /// `remove_inherent` is set.
    pub fn inherent_attributes(&self) -> &[String] {
        &self.active_attributes
    }

    /// Attribute -> values constraint of one group. Numeric predicates are
    /// expanded into the attribute values they admit. The size and
    /// attribute-count options are not dataset attributes and are left out.
    pub fn criteria(
        &self,
        group: &str,
        attributes: &AttributeConfig,
    ) -> Result<IndexMap<String, Vec<String>>> {
        let mut criteria: IndexMap<String, Vec<String>> = IndexMap::new();
        for predicate in self.group(group) {
            let attribute = predicate.attribute();
            if is_auxiliary(attribute) {
                continue;
            }
            let descriptor = attributes.get(attribute)?;
            let values = criteria.entry(attribute.to_string()).or_default();
            if descriptor.kind.is_numeric() {
                values.extend(
                    descriptor
                        .numeric_values()
                        .into_iter()
                        .filter(|(n, _)| predicate.admits_number(*n))
                        .map(|(_, text)| text),
                );
                continue;
            }
            match predicate {
                Predicate::Eq { value, .. } => values.push(value.clone()),
                Predicate::Or { alternatives } => values.extend(
                    alternatives
                        .iter()
                        .filter_map(Predicate::equality_value)
                        .map(str::to_string),
                ),
                Predicate::Range { .. } => {
                    return Err(DartboardError::DataShape(format!(
                        "Categorical attribute '{}' cannot take a range",
                        attribute
                    )));
                }
            }
        }
        Ok(criteria)
    }

    /// Flattened `[{attribute: value}, ...]` list submitted for a subgroup.
    pub fn flattened_criteria(
        &self,
        group: &str,
        attributes: &AttributeConfig,
    ) -> Result<Vec<IndexMap<String, String>>> {
        Ok(self
            .criteria(group, attributes)?
            .into_iter()
            .flat_map(|(attribute, values)| {
                values.into_iter().map(move |value| {
                    let mut entry = IndexMap::new();
                    entry.insert(attribute.clone(), value);
                    entry
                })
            })
            .collect())
    }

    /// Encode for the backend.
    pub fn to_wire(&self) -> FilterSetWire {
        FilterSetWire {
            groups: self
                .groups
                .iter()
                .map(|(id, predicates)| (id.clone(), predicates.iter().map(Predicate::to_wire).collect()))
                .collect(),
            remove_inherent: self.remove_inherent,
            similarity_attributes: self.similarity_attributes.clone(),
        }
    }

    /// Decode a wire filter set. Active attributes are recomputed from the
    /// predicates, ignoring the auxiliary options.
    pub fn from_wire(wire: &FilterSetWire) -> Result<Self> {
        let mut groups = IndexMap::new();
        let mut active: IndexSet<String> = IndexSet::new();
        for (id, expressions) in &wire.groups {
            let predicates = expressions
                .iter()
                .map(|e| Predicate::parse_wire(e))
                .collect::<Result<Vec<_>>>()?;
            active.extend(
                predicates
                    .iter()
                    .map(|p| p.attribute().to_string())
                    .filter(|a| !is_auxiliary(a)),
            );
            groups.insert(id.clone(), predicates);
        }
        Ok(Self {
            groups,
            remove_inherent: wire.remove_inherent,
            similarity_attributes: wire.similarity_attributes.clone(),
            active_attributes: active.into_iter().collect(),
        })
    }
}

/// Wire form of a [`FilterSet`]: group ids map to expression strings next to
/// the two option keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSetWire {
    #[serde(flatten)]
    pub groups: IndexMap<String, Vec<String>>,
    #[serde(rename = "remove-inherent", default)]
    pub remove_inherent: bool,
    #[serde(rename = "similarity-attributes", default)]
    pub similarity_attributes: Vec<String>,
}

/// Visibility of one similarity-attribute checkbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityOption {
    pub attribute: String,
    pub hidden: bool,
}

/// Derived state of the filter form: which similarity options are shown and
/// the minimum allowed number of attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSection {
    active_attributes: Vec<String>,
    similarity_options: Vec<SimilarityOption>,
    n_attributes_min: usize,
}

impl FilterSection {
    /// Initial state: every attribute selectable, nothing active.
    pub fn new(attributes: &AttributeConfig) -> Self {
        Self {
            active_attributes: Vec::new(),
            similarity_options: attributes
                .names()
                .map(|name| SimilarityOption {
                    attribute: name.to_string(),
                    hidden: false,
                })
                .collect(),
            n_attributes_min: 0,
        }
    }

    /// Recompute from the current form. Raises any entered
    /// `n_attributes` lower bound that is below the new minimum. Applying
    /// this twice without other input changes is a no-op.
    pub fn update(&mut self, model: &FilterModel<'_>, form: &mut FormState) -> Result<()> {
        let set = model.process_filters(form)?;
        let inherent = set.inherent_attributes();

        for option in &mut self.similarity_options {
            option.hidden = set.remove_inherent && inherent.contains(&option.attribute);
        }
        self.n_attributes_min = inherent.len();
        self.active_attributes = inherent.to_vec();

        for group in [GROUP_ONE, GROUP_TWO, LINKED_GROUP] {
            let key = FilterKey::format(group, N_ATTRIBUTES_OPTION, Some("lower-bound"));
            let entered = form.get(&key).and_then(|v| v.trim().parse::<f64>().ok());
            if let Some(value) = entered {
                if value < self.n_attributes_min as f64 {
                    debug!(group, value, min = self.n_attributes_min, "raising attribute count bound");
                    form.set(&key, self.n_attributes_min.to_string());
                }
            }
        }
        Ok(())
    }

    pub fn active_attributes(&self) -> &[String] {
        &self.active_attributes
    }

    pub fn similarity_options(&self) -> &[SimilarityOption] {
        &self.similarity_options
    }

    /// Similarity attributes currently offered.
    pub fn visible_similarity_attributes(&self) -> Vec<&str> {
        self.similarity_options
            .iter()
            .filter(|o| !o.hidden)
            .map(|o| o.attribute.as_str())
            .collect()
    }

    /// Minimum allowed `n_attributes` value.
    pub fn n_attributes_min(&self) -> usize {
        self.n_attributes_min
    }
}
