//! Filter construction: form input, structured predicates and filter sets.

mod form;
mod model;
mod predicate;

pub use form::{
    FieldInput, FilterKey, FormState, NumericInput, GROUP_ONE, GROUP_TWO, LINKED_GROUP,
};
pub use model::{
    FilterModel, FilterSection, FilterSet, FilterSetWire, SimilarityOption, EMPTY_SUBGROUP_MESSAGE,
};
pub use predicate::{Bound, Comparison, JoinOp, Predicate};
