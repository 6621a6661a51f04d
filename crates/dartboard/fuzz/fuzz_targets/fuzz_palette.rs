//! Fuzz target for palette specs.
//!
//! Parsed palettes must always span 0 to 1 with sorted stops, and
//! interpolate without panicking for any input value.

#![no_main]

use arbitrary::Arbitrary;
use dartboard::ColorMap;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct PaletteInput {
    spec: String,
    value: f64,
    categories: u8,
}

fuzz_target!(|input: PaletteInput| {
    if input.spec.len() > 1_000 {
        return;
    }
    if let Ok(map) = ColorMap::parse(&input.spec) {
        let placements = map.placements();
        assert_eq!(placements.first().copied(), Some(0.0));
        assert_eq!(placements.last().copied(), Some(1.0));
        assert!(placements.windows(2).all(|w| w[0] <= w[1]));

        let _ = map.get_color(input.value);
        for index in 0..usize::from(input.categories) {
            let _ = map.get_cat(index, usize::from(input.categories));
        }
        let _ = map.colorbar_ticks(0.1);
    }
});
