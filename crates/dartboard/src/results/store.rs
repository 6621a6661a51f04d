//! Append-only store of raw records and their derived entries.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{DartboardError, Result};
use crate::schema::AttributeIdentifiers;
use crate::view::FacetState;

use super::entry::SimilarityEntry;
use super::record::RawRecord;

/// What one [`SimilarityResultStore::ingest`] call added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Raw indices of the new entries.
    pub new_entries: Vec<usize>,
    /// Levels seen for the first time.
    pub new_levels: Vec<usize>,
    /// Raw indices of records that produced no entry.
    pub dropped: Vec<usize>,
}

/// All raw records received so far, plus one entry per comparable record.
///
/// A record is dropped when its subgroups report different added criteria,
/// or when its shared subgroup is defined by an attribute it also scores.
/// Dropped records keep their position, so raw indices always match the
/// backend's list. Several entries may describe the same subgroup over
/// different similarity attributes; the visible one is chosen per read.
#[derive(Debug, Clone, Default)]
pub struct SimilarityResultStore {
    records: Vec<RawRecord>,
    entries: Vec<SimilarityEntry>,
}

impl SimilarityResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest the backend's full result list. Records before
    /// `previously_ingested` were seen already and are skipped; each new
    /// comparable record becomes an entry and registers its level with
    /// `facets`. The offset must equal the number of records held.
    pub fn ingest(
        &mut self,
        raw: &[RawRecord],
        previously_ingested: usize,
        excluded: &[String],
        identifiers: &AttributeIdentifiers,
        facets: &mut FacetState,
    ) -> Result<IngestReport> {
        if previously_ingested != self.records.len() || raw.len() < previously_ingested {
            return Err(DartboardError::DataShape(format!(
                "Cannot ingest {} records from offset {} into a store holding {}",
                raw.len(),
                previously_ingested,
                self.records.len()
            )));
        }

        let mut report = IngestReport::default();
        for record in &raw[previously_ingested..] {
            let raw_index = self.records.len();
            self.records.push(record.clone());

            if !record.added_criteria_match() {
                debug!(raw_index, "dropping record with mismatched added criteria");
                report.dropped.push(raw_index);
                continue;
            }
            let entry = SimilarityEntry::from_record(raw_index, record, excluded, identifiers);
            if entry.scores_shared_attribute() {
                debug!(raw_index, "dropping record scoring a shared attribute");
                report.dropped.push(raw_index);
                continue;
            }

            if facets.register_level(entry.level) {
                report.new_levels.push(entry.level);
            }
            facets.register_entry(&entry);
            self.entries.push(entry);
            report.new_entries.push(raw_index);
        }

        if !report.dropped.is_empty() {
            warn!(dropped = report.dropped.len(), "records skipped as not comparable");
        }
        debug!(
            added = report.new_entries.len(),
            total = self.entries.len(),
            new_levels = ?report.new_levels,
            "ingested similarity records"
        );
        Ok(report)
    }

    /// Entries visible under the current facet selection, in ingest order.
    pub fn filter_entries<'s>(&'s self, facets: &FacetState) -> Vec<&'s SimilarityEntry> {
        match facets.selected_level() {
            Some(level) => self.level_entries(level, facets),
            None => Vec::new(),
        }
    }

    /// Entries of one level that pass the option facets, one per subgroup:
    /// the entry scoring the most attributes, all of them checked. Ties keep
    /// the earliest entry.
    pub fn level_entries<'s>(&'s self, level: usize, facets: &FacetState) -> Vec<&'s SimilarityEntry> {
        let mut best: IndexMap<Vec<(&str, &str)>, &SimilarityEntry> = IndexMap::new();
        for entry in self
            .entries
            .iter()
            .filter(|e| e.level == level && facets.matches_options(e))
        {
            let mut subgroup: Vec<(&str, &str)> = entry
                .shared_criteria
                .iter()
                .map(|(a, v)| (a.as_str(), v.as_str()))
                .collect();
            subgroup.sort_unstable();
            match best.entry(subgroup) {
                Entry::Occupied(mut slot) => {
                    if entry.similarity_attributes.len() > slot.get().similarity_attributes.len() {
                        slot.insert(entry);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }
        let mut selected: Vec<&SimilarityEntry> = best.into_values().collect();
        selected.sort_by_key(|e| e.raw_index);
        selected
    }

    /// Raw record by index, for detail lookups.
    pub fn record(&self, raw_index: usize) -> Option<&RawRecord> {
        self.records.get(raw_index)
    }

    /// Entry by raw index; `None` for dropped records.
    pub fn entry(&self, raw_index: usize) -> Option<&SimilarityEntry> {
        self.entries
            .binary_search_by_key(&raw_index, |e| e.raw_index)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &[SimilarityEntry] {
        &self.entries
    }

    /// Number of ingested records, dropped ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop everything, e.g. before a new comparison.
    pub fn clear(&mut self) {
        self.records.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::FacetGroup;
    use serde_json::json;

    fn records() -> Vec<RawRecord> {
        serde_json::from_value(json!([
            {
                "Subgroup 1": {"criteria": {"region": "east"}},
                "Subgroup 2": {"criteria": {"region": "west"}},
                "overall": 0.3
            },
            {
                "Subgroup 1": {"criteria": {"region": "east", "sex": "F"}},
                "Subgroup 2": {"criteria": {"region": "east", "sex": "M"}},
                "overall": 0.8,
                "sex": 0.8
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_ingest_levels() {
        let ids = AttributeIdentifiers::generate(["region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        let report = store.ingest(&records(), 0, &[], &ids, &mut facets).unwrap();

        assert_eq!(report.new_entries, vec![0, 1]);
        assert_eq!(report.new_levels, vec![0, 1]);
        assert!(report.dropped.is_empty());
        assert_eq!(store.entry(1).unwrap().level, 1);
        assert_eq!(facets.selected_level(), Some(0));
    }

    #[test]
    fn test_ingest_skips_seen_records() {
        let ids = AttributeIdentifiers::generate(["region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        let all = records();
        store.ingest(&all[..1], 0, &[], &ids, &mut facets).unwrap();
        let report = store.ingest(&all, 1, &[], &ids, &mut facets).unwrap();
        assert_eq!(report.new_entries, vec![1]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.record(1), Some(&all[1]));
    }

    #[test]
    fn test_ingest_rejects_offset_mismatch() {
        let ids = AttributeIdentifiers::generate(["region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        let all = records();

        let err = store.ingest(&all, 1, &[], &ids, &mut facets).unwrap_err();
        assert!(matches!(err, DartboardError::DataShape(_)));
        assert!(store.is_empty());

        store.ingest(&all, 0, &[], &ids, &mut facets).unwrap();
        assert!(store.ingest(&all[..1], 2, &[], &ids, &mut facets).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ingest_drops_mismatched_added_criteria() {
        let ids = AttributeIdentifiers::generate(["region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        let raw: Vec<RawRecord> = serde_json::from_value(json!([
            {
                "Subgroup 1": {"criteria": {"sex": "F", "region": "east"}, "added_criteria": {"region": "east"}},
                "Subgroup 2": {"criteria": {"sex": "M", "region": "west"}, "added_criteria": {"region": "west"}},
                "overall": 0.4
            },
            {
                "Subgroup 1": {"criteria": {"sex": "F", "region": "east"}, "added_criteria": {"region": "east"}},
                "Subgroup 2": {"criteria": {"sex": "M", "region": "east"}, "added_criteria": {"region": "east"}},
                "overall": 0.6
            }
        ]))
        .unwrap();

        let report = store.ingest(&raw, 0, &[], &ids, &mut facets).unwrap();
        assert_eq!(report.dropped, vec![0]);
        assert_eq!(report.new_entries, vec![1]);
        assert!(store.entry(0).is_none());
        assert_eq!(store.entry(1).unwrap().raw_index, 1);
        assert_eq!(store.record(0), Some(&raw[0]));
        assert_eq!(facets.levels(), &[1]);
    }

    #[test]
    fn test_ingest_drops_scored_shared_attribute() {
        let ids = AttributeIdentifiers::generate(["region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        let raw: Vec<RawRecord> = serde_json::from_value(json!([{
            "Subgroup 1": {"criteria": {"region": "east", "sex": "F"}},
            "Subgroup 2": {"criteria": {"region": "east", "sex": "M"}},
            "overall": 0.9,
            "similarity_attributes": ["region", "sex"]
        }]))
        .unwrap();

        let report = store.ingest(&raw, 0, &[], &ids, &mut facets).unwrap();
        assert_eq!(report.dropped, vec![0]);
        assert!(store.entries().is_empty());
        assert_eq!(store.len(), 1);
        assert!(facets.levels().is_empty());
    }

    #[test]
    fn test_one_entry_per_subgroup() {
        let ids = AttributeIdentifiers::generate(["age", "region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        let raw: Vec<RawRecord> = serde_json::from_value(json!([
            {
                "Subgroup 1": {"criteria": {"region": "east", "sex": "F"}},
                "Subgroup 2": {"criteria": {"region": "east", "sex": "M"}},
                "overall": 0.7,
                "similarity_attributes": ["age"]
            },
            {
                "Subgroup 1": {"criteria": {"sex": "F", "region": "east"}},
                "Subgroup 2": {"criteria": {"sex": "M", "region": "east"}},
                "overall": 0.5,
                "similarity_attributes": ["age", "sex"]
            },
            {
                "Subgroup 1": {"criteria": {"region": "west", "sex": "F"}},
                "Subgroup 2": {"criteria": {"region": "west", "sex": "M"}},
                "overall": 0.6,
                "similarity_attributes": ["age"]
            }
        ]))
        .unwrap();
        store.ingest(&raw, 0, &[], &ids, &mut facets).unwrap();

        let visible = |facets: &FacetState| -> Vec<usize> {
            store.filter_entries(facets).iter().map(|e| e.raw_index).collect()
        };
        assert_eq!(visible(&facets), vec![1, 2]);

        facets
            .set(&FacetGroup::SimilarityAttributes, "sex", false)
            .unwrap();
        assert_eq!(visible(&facets), vec![0, 2]);

        facets
            .set(&FacetGroup::SimilarityAttributes, "age", false)
            .unwrap();
        assert!(visible(&facets).is_empty());
    }

    #[test]
    fn test_filter_entries_by_level() {
        let ids = AttributeIdentifiers::generate(["region", "sex"]);
        let mut facets = FacetState::new();
        let mut store = SimilarityResultStore::new();
        store.ingest(&records(), 0, &[], &ids, &mut facets).unwrap();

        let visible = store.filter_entries(&facets);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].raw_index, 0);

        facets.select_level(1).unwrap();
        let visible = store.filter_entries(&facets);
        assert_eq!(visible.iter().map(|e| e.raw_index).collect::<Vec<_>>(), vec![1]);
    }
}
