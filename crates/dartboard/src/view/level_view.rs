//! Level-based results browser.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::color::{Foreground, Rgb};
use crate::error::{DartboardError, Result};
use crate::results::{IndexValueTable, IngestReport, RawRecord, SimilarityEntry, SimilarityResultStore};
use crate::session::Session;

use super::detail::{DetailCard, DetailPanel};
use super::facets::FacetState;

/// Display row for one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryRow {
    pub raw_index: usize,
    pub name: String,
    pub level: usize,
    /// Identifier signature of the shared attributes.
    pub group_key: String,
    pub similarity: Option<f64>,
    /// Headline similarity at the session's precision, empty when absent.
    pub display: String,
    pub background: Option<Rgb>,
    pub foreground: Option<Foreground>,
    pub similarity_attributes: Vec<String>,
    pub active: bool,
}

impl EntryRow {
    fn new(entry: &SimilarityEntry, session: &Session, active: bool) -> Self {
        let similarity = entry.headline_similarity();
        let swatch = similarity.map(|v| session.similarity_color(v));
        Self {
            raw_index: entry.raw_index,
            name: entry.name(),
            level: entry.level,
            group_key: entry.group_key(session.identifiers()),
            similarity,
            display: similarity.map(|v| session.format_score(v)).unwrap_or_default(),
            background: swatch.map(|(bg, _)| bg),
            foreground: swatch.map(|(_, fg)| fg),
            similarity_attributes: entry.similarity_attributes.clone(),
            active,
        }
    }
}

/// Entries of one level, grouped by the attributes defining the subgroup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelBucket {
    pub level: usize,
    /// Whether this is the selected level.
    pub selected: bool,
    pub groups: IndexMap<String, Vec<EntryRow>>,
}

impl LevelBucket {
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Result of activating an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The entry became active, replacing `previous` if there was one.
    Activated { previous: Option<usize> },
    /// The entry was already active; nothing changed.
    AlreadyActive,
}

/// Ingested results, facet selections and the single active entry with its
/// detail panel.
#[derive(Debug, Clone, Default)]
pub struct LevelFilterView {
    store: SimilarityResultStore,
    facets: FacetState,
    active: Option<usize>,
    detail: Option<DetailPanel>,
}

impl LevelFilterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest the backend's full result list, skipping records already held.
    /// `excluded` attributes never count as shared criteria.
    pub fn ingest(
        &mut self,
        raw: &[RawRecord],
        session: &Session,
        excluded: &[String],
    ) -> Result<IngestReport> {
        let previously_ingested = self.store.len();
        self.store.ingest(
            raw,
            previously_ingested,
            excluded,
            session.identifiers(),
            &mut self.facets,
        )
    }

    pub fn store(&self) -> &SimilarityResultStore {
        &self.store
    }

    pub fn facets(&self) -> &FacetState {
        &self.facets
    }

    /// Facet selections; the visible set is recomputed on every read.
    pub fn facets_mut(&mut self) -> &mut FacetState {
        &mut self.facets
    }

    /// Switch the level facet. Moving to another level closes the detail
    /// panel.
    pub fn select_level(&mut self, level: usize) -> Result<()> {
        let previous = self.facets.selected_level();
        self.facets.select_level(level)?;
        if previous != Some(level) {
            self.deactivate();
        }
        Ok(())
    }

    /// Cards of the detail panel whose similarity attribute is checked.
    pub fn visible_cards(&self) -> Vec<&DetailCard> {
        self.detail
            .as_ref()
            .map(|panel| {
                panel
                    .cards
                    .iter()
                    .filter(|c| self.facets.is_similarity_attribute_checked(&c.header.attribute))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rows visible under the current facets, in ingest order.
    pub fn visible_rows(&self, session: &Session) -> Vec<EntryRow> {
        self.store
            .filter_entries(&self.facets)
            .into_iter()
            .map(|e| EntryRow::new(e, session, self.active == Some(e.raw_index)))
            .collect()
    }

    /// One bucket per level in ascending order, holding one entry per
    /// subgroup among those that pass the option facets.
    pub fn level_buckets(&self, session: &Session) -> Vec<LevelBucket> {
        let selected = self.facets.selected_level();
        self.facets
            .sorted_levels()
            .into_iter()
            .map(|level| {
                let mut groups: IndexMap<String, Vec<EntryRow>> = IndexMap::new();
                for entry in self.store.level_entries(level, &self.facets) {
                    let row = EntryRow::new(entry, session, self.active == Some(entry.raw_index));
                    groups.entry(row.group_key.clone()).or_default().push(row);
                }
                LevelBucket {
                    level,
                    selected: selected == Some(level),
                    groups,
                }
            })
            .collect()
    }

    /// Make an entry active and rebuild the detail panel. Activating the
    /// active entry again does nothing.
    pub fn activate(
        &mut self,
        raw_index: usize,
        session: &Session,
        table: Option<&IndexValueTable>,
    ) -> Result<Activation> {
        if self.active == Some(raw_index) {
            return Ok(Activation::AlreadyActive);
        }
        let (entry, record) = self
            .store
            .entry(raw_index)
            .zip(self.store.record(raw_index))
            .ok_or_else(|| DartboardError::DataShape(format!("No entry at index {}", raw_index)))?;

        let panel = DetailPanel::build(entry, record, session, table);
        let previous = self.active.replace(raw_index);
        self.detail = Some(panel);
        debug!(raw_index, ?previous, "activated entry");
        Ok(Activation::Activated { previous })
    }

    pub fn active_entry(&self) -> Option<&SimilarityEntry> {
        self.active.and_then(|i| self.store.entry(i))
    }

    pub fn detail(&self) -> Option<&DetailPanel> {
        self.detail.as_ref()
    }

    pub fn detail_mut(&mut self) -> Option<&mut DetailPanel> {
        self.detail.as_mut()
    }

    /// Close the detail panel.
    pub fn deactivate(&mut self) {
        self.active = None;
        self.detail = None;
    }

    /// Drop all results and selections.
    pub fn clear(&mut self) {
        self.store.clear();
        self.facets.clear();
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::schema::{AttributeConfig, AttributeDescriptor};
    use crate::view::FacetGroup;
    use serde_json::json;

    fn session() -> Session {
        let attributes = AttributeConfig::from_descriptors(vec![
            AttributeDescriptor::categorical("sex", ["F", "M"]),
            AttributeDescriptor::categorical("region", ["east", "west"]),
        ])
        .unwrap();
        Session::new(DashboardConfig::default(), attributes).unwrap()
    }

    fn record(c1: serde_json::Value, c2: serde_json::Value, overall: f64) -> RawRecord {
        serde_json::from_value(json!({
            "Subgroup 1": {"criteria": c1},
            "Subgroup 2": {"criteria": c2},
            "overall": overall,
            "sex": overall
        }))
        .unwrap()
    }

    fn records() -> Vec<RawRecord> {
        vec![
            record(json!({"sex": "F"}), json!({"sex": "M"}), 0.9),
            record(json!({"region": "east", "sex": "F"}), json!({"region": "east", "sex": "M"}), 0.7),
            record(json!({"region": "west", "sex": "F"}), json!({"region": "west", "sex": "M"}), 0.6),
        ]
    }

    #[test]
    fn test_ingest_appends_only_new_records() {
        let session = session();
        let mut view = LevelFilterView::new();
        let all = records();

        let first = view.ingest(&all[..1], &session, &[]).unwrap();
        assert_eq!(first.new_entries, vec![0]);
        assert_eq!(first.new_levels, vec![0]);

        let second = view.ingest(&all, &session, &[]).unwrap();
        assert_eq!(second.new_entries, vec![1, 2]);
        assert_eq!(second.new_levels, vec![1]);
        assert_eq!(view.store().len(), 3);
        assert_eq!(view.facets().selected_level(), Some(0));
    }

    #[test]
    fn test_visible_rows_follow_level() {
        let session = session();
        let mut view = LevelFilterView::new();
        view.ingest(&records(), &session, &[]).unwrap();

        let rows = view.visible_rows(&session);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Overall");
        assert_eq!(rows[0].display, "0.900");

        view.facets_mut().select_level(1).unwrap();
        let names: Vec<String> = view.visible_rows(&session).into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["region: east", "region: west"]);

        view.facets_mut()
            .set(&FacetGroup::Attribute("region".into()), "west", false)
            .unwrap();
        let names: Vec<String> = view.visible_rows(&session).into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["region: east"]);
    }

    #[test]
    fn test_level_buckets() {
        let session = session();
        let mut view = LevelFilterView::new();
        view.ingest(&records(), &session, &[]).unwrap();

        let buckets = view.level_buckets(&session);
        assert_eq!(buckets.len(), 2);
        assert!(buckets[0].selected);
        assert_eq!(buckets[0].groups.keys().collect::<Vec<_>>(), [""]);
        assert_eq!(buckets[1].level, 1);
        assert_eq!(buckets[1].len(), 2);
        // region sorts first, so it gets the first token
        assert_eq!(buckets[1].groups.keys().collect::<Vec<_>>(), ["ta"]);
    }

    #[test]
    fn test_selection_protocol() {
        let session = session();
        let mut view = LevelFilterView::new();
        view.ingest(&records(), &session, &[]).unwrap();

        assert_eq!(
            view.activate(1, &session, None).unwrap(),
            Activation::Activated { previous: None }
        );
        assert_eq!(view.activate(1, &session, None).unwrap(), Activation::AlreadyActive);
        assert_eq!(
            view.activate(2, &session, None).unwrap(),
            Activation::Activated { previous: Some(1) }
        );
        assert_eq!(view.detail().unwrap().raw_index, 2);
        assert_eq!(view.active_entry().unwrap().raw_index, 2);
        assert!(view.activate(9, &session, None).is_err());
        assert_eq!(view.active_entry().unwrap().raw_index, 2);

        view.deactivate();
        assert!(view.detail().is_none());
    }

    #[test]
    fn test_level_switch_closes_detail() {
        let session = session();
        let mut view = LevelFilterView::new();
        view.ingest(&records(), &session, &[]).unwrap();
        view.activate(0, &session, None).unwrap();

        view.select_level(0).unwrap();
        assert_eq!(view.active_entry().map(|e| e.raw_index), Some(0));

        view.select_level(1).unwrap();
        assert!(view.active_entry().is_none());
        assert!(view.detail().is_none());
        assert!(view.select_level(4).is_err());
        assert_eq!(view.facets().selected_level(), Some(1));
    }

    #[test]
    fn test_cards_follow_similarity_facets() {
        let session = session();
        let mut view = LevelFilterView::new();
        let raw: RawRecord = serde_json::from_value(json!({
            "Subgroup 1": {"criteria": {"sex": "F"}},
            "Subgroup 2": {"criteria": {"sex": "M"}},
            "overall": 0.5,
            "region": 0.4,
            "sex": 0.6
        }))
        .unwrap();
        view.ingest(&[raw], &session, &[]).unwrap();
        view.activate(0, &session, None).unwrap();
        assert_eq!(view.visible_cards().len(), 2);

        view.facets_mut()
            .set(&FacetGroup::SimilarityAttributes, "region", false)
            .unwrap();
        let cards: Vec<&str> = view
            .visible_cards()
            .iter()
            .map(|c| c.header.attribute.as_str())
            .collect();
        assert_eq!(cards, ["sex"]);
    }

    #[test]
    fn test_buckets_keep_widest_similarity_set() {
        let session = session();
        let mut view = LevelFilterView::new();
        let raw: Vec<RawRecord> = serde_json::from_value(json!([
            {
                "Subgroup 1": {"criteria": {"region": "east", "sex": "F"}},
                "Subgroup 2": {"criteria": {"region": "east", "sex": "M"}},
                "overall": 0.3,
                "similarity_attributes": ["sex"]
            },
            {
                "Subgroup 1": {"criteria": {"region": "east", "sex": "F"}},
                "Subgroup 2": {"criteria": {"region": "east", "sex": "M"}},
                "overall": 0.8,
                "similarity_attributes": []
            }
        ]))
        .unwrap();
        view.ingest(&raw, &session, &[]).unwrap();

        let buckets = view.level_buckets(&session);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].len(), 1);
        assert_eq!(buckets[0].groups["ta"][0].raw_index, 0);
        assert_eq!(view.visible_rows(&session).len(), 1);
    }

    #[test]
    fn test_excluded_attributes_are_not_shared() {
        let session = session();
        let mut view = LevelFilterView::new();
        view.ingest(&records(), &session, &["region".to_string()]).unwrap();
        assert!(view.store().entries().iter().all(|e| e.level == 0));
    }
}
