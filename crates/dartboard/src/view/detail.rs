//! Detail panel for the active entry: one card per similarity dimension,
//! each with a colored header and, when the data is available, the two
//! subgroups' value distributions side by side.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::color::{ColorSet, Foreground, Rgb};
use crate::error::{DartboardError, Result};
use crate::results::{Distribution, IndexValueTable, RawRecord, RawSubgroup, SimilarityEntry};
use crate::schema::AttributeValues;
use crate::session::Session;

use super::chart::{BarChartConfig, ChartKind, ChartLayout};
use super::format::{format_subgroup_name, LegendLayout, DEFAULT_LEGEND_ROWS, OVERALL_NAME};

/// One side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgroupSummary {
    pub label: String,
    pub name: String,
    pub criteria: IndexMap<String, String>,
    pub size: Option<u64>,
}

impl SubgroupSummary {
    fn from_raw(label: &str, subgroup: &RawSubgroup) -> Self {
        let criteria = subgroup.criteria_text();
        Self {
            label: label.to_string(),
            name: format_subgroup_name(&criteria),
            criteria,
            size: subgroup.size.or_else(|| {
                (!subgroup.indices.is_empty()).then_some(subgroup.indices.len() as u64)
            }),
        }
    }
}

/// Colored header of a dimension card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionHeader {
    pub attribute: String,
    pub display_name: String,
    pub similarity: f64,
    /// Similarity at the session's precision.
    pub display: String,
    pub background: Rgb,
    pub foreground: Foreground,
}

/// Legend row of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub value: String,
    pub display_name: String,
    /// `None` when the color set has no entry for the value.
    pub color: Option<Rgb>,
}

/// Paired distribution charts of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionView {
    pub attribute: String,
    pub kind: ChartKind,
    /// `(value, proportion)` per subgroup, in legend order.
    pub proportions: [Vec<(String, f64)>; 2],
    pub charts: [ChartLayout; 2],
    pub legend: Vec<LegendEntry>,
    pub legend_layout: LegendLayout,
}

impl DistributionView {
    fn build(
        session: &Session,
        attribute: &str,
        colors: &ColorSet,
        distributions: [&Distribution; 2],
    ) -> Result<Self> {
        let descriptor = session.attributes().get(attribute)?;
        let values = match &descriptor.values {
            AttributeValues::Categories(_) => {
                let mut ordered: Vec<String> = descriptor
                    .category_values()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                for d in distributions {
                    for value in d.counts.keys() {
                        if !ordered.contains(value) {
                            ordered.push(value.clone());
                        }
                    }
                }
                ordered
            }
            AttributeValues::Range(_) => observed_numeric_values(distributions),
        };

        let proportions = distributions.map(|d| {
            values
                .iter()
                .map(|v| (v.clone(), d.proportion(v)))
                .collect::<Vec<_>>()
        });
        let legend = values
            .iter()
            .map(|value| LegendEntry {
                display_name: descriptor.value_display_name(value).to_string(),
                color: colors.color_for(value),
                value: value.clone(),
            })
            .collect::<Vec<_>>();

        let kind = ChartKind::default();
        let config = &session.config().chart;
        Ok(Self {
            attribute: attribute.to_string(),
            kind,
            charts: layouts(kind, config, &proportions),
            legend_layout: LegendLayout::vertical(legend.len(), DEFAULT_LEGEND_ROWS),
            proportions,
            legend,
        })
    }

    fn set_kind(&mut self, kind: ChartKind, config: &BarChartConfig) {
        self.kind = kind;
        self.charts = layouts(kind, config, &self.proportions);
    }
}

fn layouts(
    kind: ChartKind,
    config: &BarChartConfig,
    proportions: &[Vec<(String, f64)>; 2],
) -> [ChartLayout; 2] {
    [
        ChartLayout::compute(kind, config, &proportions[0]),
        ChartLayout::compute(kind, config, &proportions[1]),
    ]
}

/// Distinct values seen in either subgroup, numerically ascending.
fn observed_numeric_values(distributions: [&Distribution; 2]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for d in distributions {
        for value in d.counts.keys() {
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
    }
    values.sort_by(|a, b| {
        match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        }
    });
    values
}

/// One similarity dimension of the active entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailCard {
    pub header: DimensionHeader,
    pub distribution: Option<DistributionView>,
}

/// Contents of the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailPanel {
    pub raw_index: usize,
    /// Name of the shared subgroup.
    pub name: String,
    pub subgroups: [SubgroupSummary; 2],
    pub overlap: Option<u64>,
    pub overall: Option<DimensionHeader>,
    pub cards: Vec<DetailCard>,
    #[serde(skip)]
    chart_config: BarChartConfig,
}

impl DetailPanel {
    /// Build the panel for an entry. Distributions need the index value
    /// table; a dimension whose configuration, color set or values are
    /// missing gets a header only.
    pub fn build(
        entry: &SimilarityEntry,
        record: &RawRecord,
        session: &Session,
        table: Option<&IndexValueTable>,
    ) -> Self {
        let cards = entry
            .dimensions()
            .map(|(attribute, similarity)| DetailCard {
                header: header(session, attribute, similarity),
                distribution: table.and_then(|t| distribution(session, attribute, record, t)),
            })
            .collect();

        Self {
            raw_index: entry.raw_index,
            name: entry.name(),
            subgroups: [
                SubgroupSummary::from_raw("Subgroup 1", &record.subgroup_1),
                SubgroupSummary::from_raw("Subgroup 2", &record.subgroup_2),
            ],
            overlap: record.overlap,
            overall: entry.overall().map(|v| header(session, OVERALL_NAME, v)),
            cards,
            chart_config: session.config().chart.clone(),
        }
    }

    pub fn card(&self, attribute: &str) -> Option<&DetailCard> {
        self.cards.iter().find(|c| c.header.attribute == attribute)
    }

    /// Switch the chart kind of one attribute's distribution.
    pub fn set_chart_kind(&mut self, attribute: &str, kind: ChartKind) -> Result<()> {
        let view = self
            .cards
            .iter_mut()
            .find(|c| c.header.attribute == attribute)
            .and_then(|c| c.distribution.as_mut())
            .ok_or_else(|| {
                DartboardError::DataShape(format!("No distribution shown for '{}'", attribute))
            })?;
        view.set_kind(kind, &self.chart_config);
        Ok(())
    }
}

fn header(session: &Session, attribute: &str, similarity: f64) -> DimensionHeader {
    let (background, foreground) = session.similarity_color(similarity);
    DimensionHeader {
        attribute: attribute.to_string(),
        display_name: session.attributes().display_name(attribute).to_string(),
        similarity,
        display: session.format_score(similarity),
        background,
        foreground,
    }
}

fn distribution(
    session: &Session,
    attribute: &str,
    record: &RawRecord,
    table: &IndexValueTable,
) -> Option<DistributionView> {
    let build = || -> Result<DistributionView> {
        let colors = session.colors().get(attribute)?;
        let first = Distribution::from_indices(attribute, &record.subgroup_1.indices, table)?;
        let second = Distribution::from_indices(attribute, &record.subgroup_2.indices, table)?;
        DistributionView::build(session, attribute, colors, [&first, &second])
    };
    match build() {
        Ok(view) => Some(view),
        Err(e) => {
            warn!(attribute, "skipping distribution: {}", e);
            None
        }
    }
}
