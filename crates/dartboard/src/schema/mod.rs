//! Dataset attribute descriptors and identifier tokens.

mod attribute;
mod identifiers;
mod types;

pub use attribute::{
    is_auxiliary, AttributeConfig, AttributeDescriptor, N_ATTRIBUTES_OPTION,
    SIMILARITY_ATTRIBUTES_OPTION, SIZE_OPTION,
};
pub use identifiers::AttributeIdentifiers;
pub use types::{
    number_text, scalar_text, AttributeKind, AttributeValues, CategoryValue, NumericRange,
    MAX_RANGE_VALUES,
};
