//! Result presentation: facets, the level browser, the detail panel and
//! chart layout.

mod chart;
mod detail;
mod facets;
mod format;
mod level_view;

pub use chart::{Bar, BarChartConfig, ChartKind, ChartLayout, Rect};
pub use detail::{DetailCard, DetailPanel, DimensionHeader, DistributionView, LegendEntry, SubgroupSummary};
pub use facets::{FacetGroup, FacetState};
pub use format::{
    format_score, format_subgroup_name, round_to, LegendLayout, DEFAULT_LEGEND_COLUMNS,
    DEFAULT_LEGEND_ROWS, OVERALL_NAME,
};
pub use level_view::{Activation, EntryRow, LevelBucket, LevelFilterView};
