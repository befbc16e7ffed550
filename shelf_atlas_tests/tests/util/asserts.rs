// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Various helper functions to assert truths during testing.

use shelf_atlas::{AtlasCache, FontContext, LivenessProvider, TextureBackend};

/// Assert that shelves stack without gaps and that every resident glyph has a
/// slot of its own inside its sheet.
pub(crate) fn assert_atlas_consistent<B: TextureBackend>(cache: &AtlasCache<B>) {
    let size = cache.config().sheet_size;
    let mut slot_count = 0;

    for sheet in 0..cache.sheet_count() {
        let shelves = cache.shelves(sheet).unwrap();
        let mut expected_baseline = 0;
        for (i, shelf) in shelves.iter().enumerate() {
            assert_eq!(
                shelf.baseline(),
                expected_baseline,
                "shelf {i} of sheet {sheet} does not sit on the previous one"
            );
            expected_baseline = shelf.baseline() + shelf.height();
            assert!(
                expected_baseline <= size,
                "shelf {i} of sheet {sheet} extends past the sheet"
            );

            let mut right = 0;
            for slot in shelf.slots() {
                assert!(slot.x >= right, "overlapping slots on shelf {i} of sheet {sheet}");
                assert!(slot.height <= shelf.height(), "slot taller than shelf {i}");
                right = slot.x + slot.width;
                assert!(right <= size, "slot past the right edge on shelf {i}");
            }
            slot_count += shelf.len();
        }
    }
    assert_eq!(slot_count, cache.len(), "slots and resident glyphs disagree");

    for glyph in cache.glyphs() {
        let placement = glyph
            .placement()
            .unwrap_or_else(|| panic!("resident glyph {:?} has no placement", glyph.key()));
        assert!(placement.right() <= size && placement.bottom() <= size);
        assert_eq!((placement.width, placement.height), (glyph.width(), glyph.height()));

        let shelf = &cache.shelves(placement.sheet).unwrap()[placement.shelf];
        assert_eq!(placement.y, shelf.baseline());
        assert!(
            shelf
                .slots()
                .iter()
                .any(|slot| slot.key == glyph.key() && slot.x == placement.x),
            "glyph {:?} is missing from its shelf",
            glyph.key()
        );
    }
}

/// Assert that every live glyph is resident and every resident glyph is live.
pub(crate) fn assert_live_set_resident<B: TextureBackend>(
    cache: &AtlasCache<B>,
    cx: &FontContext,
) {
    for glyph in cx.snapshot_live_glyphs() {
        assert!(
            cache.contains(glyph.key()),
            "live glyph {:?} is not resident",
            glyph.key()
        );
        assert!(glyph.is_placed());
    }
    for glyph in cache.glyphs() {
        assert!(
            cx.is_live(glyph.key()),
            "glyph {:?} survived compaction without being live",
            glyph.key()
        );
    }
}
