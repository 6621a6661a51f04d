//! Property-based tests for filter expressions, identifiers and palettes.
//!
//! ```bash
//! cargo test -p dartboard --test property_tests
//! PROPTEST_CASES=10000 cargo test -p dartboard --test property_tests
//! ```

use proptest::prelude::*;

use dartboard::color::ColorMap;
use dartboard::filter::{Bound, Comparison, JoinOp, Predicate};
use dartboard::schema::AttributeIdentifiers;
use dartboard::FormState;

// =============================================================================
// Test Strategies
// =============================================================================

fn attribute_name() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,12}"
}

fn category_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,10}"
}

/// Category values that may contain the join keywords.
fn spaced_category_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,8}( (or|and) [A-Za-z0-9]{1,8})?"
}

fn bound() -> impl Strategy<Value = Option<Bound>> {
    prop::option::of(
        (
            prop_oneof![
                Just(Comparison::Lt),
                Just(Comparison::Le),
                Just(Comparison::Gt),
                Just(Comparison::Ge)
            ],
            -1000i32..1000,
        )
            .prop_map(|(op, value)| Bound::new(op, value.to_string())),
    )
}

fn hex_color() -> impl Strategy<Value = String> {
    any::<[u8; 3]>().prop_map(|[r, g, b]| format!("#{:02x}{:02x}{:02x}", r, g, b))
}

// =============================================================================
// Expressions
// =============================================================================

proptest! {
    #[test]
    fn categorical_wire_round_trips(
        attribute in attribute_name(),
        values in prop::collection::vec(spaced_category_value(), 1..6),
    ) {
        let p = Predicate::any_of(&attribute, values).unwrap();
        prop_assert_eq!(Predicate::parse_wire(&p.to_wire()).unwrap(), p);
    }

    #[test]
    fn checked_values_give_one_clause_each(
        attribute in attribute_name(),
        values in prop::collection::vec(category_value(), 0..8),
    ) {
        match Predicate::any_of(&attribute, values.clone()) {
            None => prop_assert!(values.is_empty()),
            Some(p) => {
                prop_assert_eq!(p.clause_count(), values.len());
                prop_assert_eq!(p.to_wire().matches(" or ").count(), values.len() - 1);
            }
        }
    }

    #[test]
    fn bounds_control_clause_count(
        lower in bound(),
        upper in bound(),
        join in prop_oneof![Just(JoinOp::And), Just(JoinOp::Or)],
    ) {
        let supplied = usize::from(lower.is_some()) + usize::from(upper.is_some());
        match Predicate::range("age", lower, upper, join) {
            None => prop_assert_eq!(supplied, 0),
            Some(p) => {
                prop_assert_eq!(p.clause_count(), supplied);
                let wire = p.to_wire();
                if supplied == 2 {
                    let separator = format!(" {} ", join.keyword());
                    prop_assert_eq!(wire.matches(separator.as_str()).count(), 1);
                } else {
                    prop_assert!(!wire.contains(" and ") && !wire.contains(" or "));
                }
            }
        }
    }

    #[test]
    fn form_parsing_never_panics(body in ".{0,200}") {
        let _ = FormState::from_urlencoded(&body);
    }
}

// =============================================================================
// Identifiers
// =============================================================================

proptest! {
    #[test]
    fn identifier_tokens_round_trip(names in prop::collection::hash_set(attribute_name(), 0..40)) {
        let ids = AttributeIdentifiers::generate(names.iter().map(String::as_str));
        prop_assert_eq!(ids.len(), names.len());
        for name in &names {
            let token = ids.encode(name).expect("every name has a token");
            prop_assert_eq!(ids.decode(token), Some(name.as_str()));
        }
    }

    #[test]
    fn identifier_tokens_ignore_input_order(names in prop::collection::vec(attribute_name(), 0..20)) {
        let forward = AttributeIdentifiers::generate(names.iter().map(String::as_str));
        let backward = AttributeIdentifiers::generate(names.iter().rev().map(String::as_str));
        prop_assert_eq!(forward, backward);
    }
}

// =============================================================================
// Palettes
// =============================================================================

proptest! {
    #[test]
    fn placements_include_both_endpoints(colors in prop::collection::vec(hex_color(), 1..8)) {
        let map = ColorMap::parse(&colors.join(", ")).unwrap();
        let placements = map.placements();
        prop_assert!(placements.contains(&0.0));
        prop_assert!(placements.contains(&1.0));

        let at = |p: f64| map.stops().iter().find(|s| s.placement == p).map(|s| s.color);
        prop_assert_eq!(Some(map.get_color(0.0)), at(0.0));
        prop_assert_eq!(Some(map.get_color(1.0)), at(1.0));
    }

    #[test]
    fn explicit_placements_are_normalized(
        colors in prop::collection::vec((hex_color(), 5u32..95), 1..6),
    ) {
        let spec = colors
            .iter()
            .map(|(c, p)| format!("{} {}%", c, p))
            .collect::<Vec<_>>()
            .join(", ");
        let map = ColorMap::parse(&spec).unwrap();
        let placements = map.placements();
        prop_assert_eq!(placements.first().copied(), Some(0.0));
        prop_assert_eq!(placements.last().copied(), Some(1.0));
        prop_assert!(placements.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn colors_stay_in_gamut(colors in prop::collection::vec(hex_color(), 1..6), value in -2.0f64..3.0) {
        let map = ColorMap::parse(&colors.join(",")).unwrap();
        let c = map.get_color(value);
        for channel in [c.r, c.g, c.b] {
            prop_assert!((-1e-9..=255.0 + 1e-9).contains(&channel));
        }
    }
}
