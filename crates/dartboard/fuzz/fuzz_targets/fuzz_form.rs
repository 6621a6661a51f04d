//! Fuzz target for form decoding and filter processing.
//!
//! Arbitrary urlencoded bodies must never panic, whether decoding fails
//! or the decoded form is turned into subgroup filters.

#![no_main]

use dartboard::schema::{AttributeConfig, AttributeDescriptor};
use dartboard::{FilterModel, FormState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(form) = FormState::from_urlencoded(body) else {
        return;
    };
    let attributes = AttributeConfig::from_descriptors([
        AttributeDescriptor::categorical("region", ["north", "south"]),
        AttributeDescriptor::numeric("age", 0.0, 90.0, Some(1.0)),
    ]);
    if let Ok(attributes) = attributes {
        let _ = FilterModel::new(&attributes).process_filters(&form);
    }
});
