//! Display formatting shared by the result views.

use serde::Serialize;

/// Name shown for a subgroup with no defining criteria.
pub const OVERALL_NAME: &str = "Overall";
/// Default row limit of a vertical legend.
pub const DEFAULT_LEGEND_ROWS: usize = 5;
/// Default column limit of a horizontal legend.
pub const DEFAULT_LEGEND_COLUMNS: usize = 4;

/// `attr: value, attr: value` in the given order, or `Overall` when there
/// are no criteria.
pub fn format_subgroup_name<I, K, V>(criteria: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let parts: Vec<String> = criteria
        .into_iter()
        .map(|(k, v)| format!("{}: {}", k.as_ref(), v.as_ref()))
        .collect();
    if parts.is_empty() {
        OVERALL_NAME.to_string()
    } else {
        parts.join(", ")
    }
}

/// Round to a number of decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Fixed-precision text for a score.
pub fn format_score(value: f64, places: u32) -> String {
    format!("{:.*}", places as usize, round_to(value, places))
}

/// Grid shape of a legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendLayout {
    pub rows: usize,
    pub columns: usize,
    /// Entries fill rows first when true, columns first otherwise.
    pub row_major: bool,
}

impl LegendLayout {
    /// Fill columns top to bottom, starting a new column every `max_rows`.
    pub fn vertical(entries: usize, max_rows: usize) -> Self {
        let max_rows = max_rows.max(1);
        Self {
            rows: entries.min(max_rows),
            columns: entries.div_ceil(max_rows),
            row_major: false,
        }
    }

    /// Fill rows left to right, at most `max_columns` per row.
    pub fn horizontal(entries: usize, max_columns: usize) -> Self {
        let columns = entries.min(max_columns.max(1));
        Self {
            rows: if columns == 0 { 0 } else { entries.div_ceil(columns) },
            columns,
            row_major: true,
        }
    }

    /// `(row, column)` of the entry at `index`.
    pub fn position(&self, index: usize) -> (usize, usize) {
        if self.row_major {
            let columns = self.columns.max(1);
            (index / columns, index % columns)
        } else {
            let rows = self.rows.max(1);
            (index % rows, index / rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subgroup_name() {
        assert_eq!(format_subgroup_name(Vec::<(&str, &str)>::new()), "Overall");
        assert_eq!(
            format_subgroup_name([("region", "east"), ("sex", "F")]),
            "region: east, sex: F"
        );
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(0.5, 0), 1.0);
        assert_eq!(format_score(0.1, 3), "0.100");
    }

    #[test]
    fn test_legend_layouts() {
        let vertical = LegendLayout::vertical(12, DEFAULT_LEGEND_ROWS);
        assert_eq!((vertical.rows, vertical.columns), (5, 3));
        assert_eq!(vertical.position(6), (1, 1));

        let horizontal = LegendLayout::horizontal(6, DEFAULT_LEGEND_COLUMNS);
        assert_eq!((horizontal.rows, horizontal.columns), (2, 4));
        assert_eq!(horizontal.position(5), (1, 1));

        let empty = LegendLayout::horizontal(0, DEFAULT_LEGEND_COLUMNS);
        assert_eq!((empty.rows, empty.columns), (0, 0));
    }
}
