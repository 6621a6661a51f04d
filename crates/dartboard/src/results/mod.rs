//! Similarity results: wire records, derived entries and the result store.

mod distribution;
mod entry;
mod record;
mod store;

pub use distribution::{Distribution, IndexValueTable};
pub use entry::SimilarityEntry;
pub use record::{RawRecord, RawSubgroup, OVERALL};
pub use store::{IngestReport, SimilarityResultStore};
