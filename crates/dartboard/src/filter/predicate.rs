//! Structured filter predicates and their wire encoding.
//!
//! Wire format: categorical constraints are `attr=value` clauses joined by
//! ` or `; numeric constraints are one or two `attr<op>bound` clauses joined
//! by the selected ` and `/` or `.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DartboardError, Result};

/// Splits a clause at its first run of comparison characters.
static CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^<>=]+?)\s*(<=|>=|<|>|==|=)\s*(.*?)\s*$").unwrap());

/// Leading `name<op>` of the text after a separator.
static NEXT_CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^<>=]+?)\s*(?:<=|>=|<|>|=)").unwrap());

/// Comparison operator used in a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "=")]
    Eq,
}

impl Comparison {
    /// Wire symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "=",
        }
    }

    /// Parse a wire symbol.
    pub fn parse(symbol: &str) -> Result<Self> {
        match symbol.trim() {
            "<" => Ok(Comparison::Lt),
            "<=" => Ok(Comparison::Le),
            ">" => Ok(Comparison::Gt),
            ">=" => Ok(Comparison::Ge),
            "=" | "==" => Ok(Comparison::Eq),
            other => Err(DartboardError::Parse(format!(
                "Unknown comparison operator '{}'",
                other
            ))),
        }
    }

    /// True for `>` and `>=`.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, Comparison::Gt | Comparison::Ge)
    }

    /// Whether `lhs <op> rhs` holds.
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Eq => lhs == rhs,
        }
    }
}

/// Join operator between the two bounds of a numeric constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinOp {
    #[default]
    And,
    Or,
}

impl JoinOp {
    /// Wire keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinOp::And => "and",
            JoinOp::Or => "or",
        }
    }

    /// Parse a wire keyword (case-insensitive).
    pub fn parse(keyword: &str) -> Result<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(JoinOp::And),
            "or" => Ok(JoinOp::Or),
            other => Err(DartboardError::Parse(format!("Unknown join operator '{}'", other))),
        }
    }
}

/// One side of a numeric range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub op: Comparison,
    /// Bound value exactly as entered.
    pub value: String,
}

impl Bound {
    pub fn new(op: Comparison, value: impl Into<String>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }

    /// The bound as a number, if it parses.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }

    /// Whether `value` lies on the allowed side. A bound that is not a
    /// number admits nothing.
    pub fn admits(&self, value: f64) -> bool {
        self.numeric_value().is_some_and(|bound| self.op.holds(value, bound))
    }
}

/// A constraint on a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// `attr=value`.
    Eq { attribute: String, value: String },
    /// One or two bounds on a numeric attribute. At least one bound is set.
    Range {
        attribute: String,
        lower: Option<Bound>,
        upper: Option<Bound>,
        join: JoinOp,
    },
    /// Alternatives on the same attribute.
    Or { alternatives: Vec<Predicate> },
}

impl Predicate {
    /// Equality predicate.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Eq {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Categorical predicate over the given values: absent for none, a bare
    /// equality for one, an `Or` for several.
    pub fn any_of<I, S>(attribute: &str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut alternatives: Vec<Predicate> = values
            .into_iter()
            .map(|v| Predicate::eq(attribute, v))
            .collect();
        match alternatives.len() {
            0 => None,
            1 => alternatives.pop(),
            _ => Some(Predicate::Or { alternatives }),
        }
    }

    /// Numeric predicate; absent when neither bound is supplied.
    pub fn range(
        attribute: impl Into<String>,
        lower: Option<Bound>,
        upper: Option<Bound>,
        join: JoinOp,
    ) -> Option<Self> {
        if lower.is_none() && upper.is_none() {
            return None;
        }
        Some(Predicate::Range {
            attribute: attribute.into(),
            lower,
            upper,
            join,
        })
    }

    /// The attribute this predicate constrains.
    pub fn attribute(&self) -> &str {
        match self {
            Predicate::Eq { attribute, .. } | Predicate::Range { attribute, .. } => attribute,
            Predicate::Or { alternatives } => alternatives
                .first()
                .map(|p| p.attribute())
                .unwrap_or_default(),
        }
    }

    /// Number of clauses in the wire form.
    pub fn clause_count(&self) -> usize {
        match self {
            Predicate::Eq { .. } => 1,
            Predicate::Range { lower, upper, .. } => {
                usize::from(lower.is_some()) + usize::from(upper.is_some())
            }
            Predicate::Or { alternatives } => alternatives.iter().map(|p| p.clause_count()).sum(),
        }
    }

    /// The single value of an equality predicate.
    pub fn equality_value(&self) -> Option<&str> {
        match self {
            Predicate::Eq { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether a numeric value satisfies this predicate, honouring the
    /// strictness of each bound and the join between them.
    pub fn admits_number(&self, value: f64) -> bool {
        match self {
            Predicate::Eq { value: expected, .. } => expected
                .trim()
                .parse::<f64>()
                .is_ok_and(|expected| expected == value),
            Predicate::Range {
                lower, upper, join, ..
            } => {
                let mut checks = [lower, upper].into_iter().flatten().map(|b| b.admits(value));
                match join {
                    JoinOp::And => checks.all(|ok| ok),
                    JoinOp::Or => checks.any(|ok| ok),
                }
            }
            Predicate::Or { alternatives } => alternatives.iter().any(|p| p.admits_number(value)),
        }
    }

    /// Encode to the wire string.
    pub fn to_wire(&self) -> String {
        match self {
            Predicate::Eq { attribute, value } => format!("{}={}", attribute, value),
            Predicate::Range {
                attribute,
                lower,
                upper,
                join,
            } => [lower, upper]
                .into_iter()
                .flatten()
                .map(|b| format!("{}{}{}", attribute, b.op.symbol(), b.value))
                .collect::<Vec<_>>()
                .join(&format!(" {} ", join.keyword())),
            Predicate::Or { alternatives } => alternatives
                .iter()
                .map(Predicate::to_wire)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }

    /// Decode a wire string produced by [`Predicate::to_wire`].
    pub fn parse_wire(wire: &str) -> Result<Self> {
        let (clauses, join) = split_clauses(wire)?;
        if clauses.is_empty() {
            return Err(DartboardError::Parse("Empty filter expression".into()));
        }

        let parsed = clauses
            .iter()
            .map(|c| parse_clause(c))
            .collect::<Result<Vec<_>>>()?;

        let attribute = parsed[0].0.clone();
        if parsed.iter().any(|(a, _, _)| *a != attribute) {
            return Err(DartboardError::Parse(format!(
                "Filter expression '{}' mixes attributes",
                wire
            )));
        }

        if parsed.iter().all(|(_, op, _)| *op == Comparison::Eq) {
            if join == JoinOp::And && parsed.len() > 1 {
                return Err(DartboardError::Parse(format!(
                    "Equality clauses must be joined with 'or': '{}'",
                    wire
                )));
            }
            return Predicate::any_of(&attribute, parsed.into_iter().map(|(_, _, v)| v))
                .ok_or_else(|| DartboardError::Parse("Empty filter expression".into()));
        }

        match parsed.as_slice() {
            [(_, op, value)] => {
                let bound = Bound::new(*op, value.clone());
                let (lower, upper) = if op.is_lower_bound() {
                    (Some(bound), None)
                } else {
                    (None, Some(bound))
                };
                Ok(Predicate::Range {
                    attribute,
                    lower,
                    upper,
                    join: JoinOp::default(),
                })
            }
            [(_, op1, v1), (_, op2, v2)] if *op1 != Comparison::Eq && *op2 != Comparison::Eq => {
                Ok(Predicate::Range {
                    attribute,
                    lower: Some(Bound::new(*op1, v1.clone())),
                    upper: Some(Bound::new(*op2, v2.clone())),
                    join,
                })
            }
            _ => Err(DartboardError::Parse(format!(
                "Unsupported filter expression '{}'",
                wire
            ))),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Split an expression at the ` or `/` and ` separators that start a new
/// `name<op>` clause, so values may themselves contain the keywords or `=`.
fn split_clauses(wire: &str) -> Result<(Vec<&str>, JoinOp)> {
    let wire = wire.trim();
    if wire.is_empty() {
        return Ok((Vec::new(), JoinOp::Or));
    }

    let mut boundaries: Vec<(usize, &str, JoinOp)> = [(" or ", JoinOp::Or), (" and ", JoinOp::And)]
        .into_iter()
        .flat_map(move |(separator, join)| {
            wire.match_indices(separator)
                .map(move |(at, _)| (at, separator, join))
        })
        .filter(|(at, separator, _)| starts_clause(&wire[at + separator.len()..]))
        .collect();
    boundaries.sort_by_key(|(at, _, _)| *at);

    let mut clauses = Vec::with_capacity(boundaries.len() + 1);
    let mut join = None;
    let mut start = 0;
    for (at, separator, kind) in boundaries {
        if at < start {
            continue;
        }
        if join.is_some_and(|j| j != kind) {
            return Err(DartboardError::Parse(format!(
                "Filter expression '{}' mixes 'and' and 'or'",
                wire
            )));
        }
        join = Some(kind);
        clauses.push(wire[start..at].trim());
        start = at + separator.len();
    }
    clauses.push(wire[start..].trim());
    Ok((clauses, join.unwrap_or(JoinOp::Or)))
}

fn starts_clause(rest: &str) -> bool {
    NEXT_CLAUSE_RE
        .captures(rest)
        .is_some_and(|caps| !caps[1].contains(" or ") && !caps[1].contains(" and "))
}

fn parse_clause(clause: &str) -> Result<(String, Comparison, String)> {
    let caps = CLAUSE_RE
        .captures(clause)
        .ok_or_else(|| DartboardError::Parse(format!("Malformed clause '{}'", clause)))?;
    Ok((
        caps[1].to_string(),
        Comparison::parse(&caps[2])?,
        caps[3].to_string(),
    ))
}
