//! Fuzz target for wire predicates.
//!
//! Parsing arbitrary filter expressions and re-encoding whatever parses
//! must never panic.

#![no_main]

use dartboard::Predicate;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }
    let Ok(wire) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(predicate) = Predicate::parse_wire(wire) {
        assert!(predicate.clause_count() >= 1);
        let _ = Predicate::parse_wire(&predicate.to_wire());
    }
});
