// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end walkthroughs of typical atlas usage.

use shelf_atlas::{ErrorKind, FontContext, GlyphKey, InsertOutcome};

use crate::util::{
    assert_atlas_consistent, assert_live_set_resident, fixed_cache, glyph, glyphs,
};

#[test]
fn scenario_fifty_small_glyphs() {
    let mut cache = fixed_cache(256, 1);
    let mut cx = FontContext::new();

    let report = cache.insert_batch(&mut cx, glyphs(1, 0, 50, 10, 10)).unwrap();

    assert_eq!(report.placed_count(), 50);
    assert!(!report.compacted());
    assert!(cache.shelves(0).unwrap().len() <= 4);
    assert_eq!(cache.stats().compactions, 0);
    assert_atlas_consistent(&cache);
}

#[test]
fn scenario_full_atlas_recovers_after_fonts_are_unloaded() {
    // 64x64 holds exactly sixteen 16x16 glyphs.
    let mut cache = fixed_cache(64, 1);
    let mut cx = FontContext::new();
    for font_id in 0..4 {
        let report = cache
            .insert_batch(&mut cx, glyphs(font_id, 0, 4, 16, 16))
            .unwrap();
        assert_eq!(report.placed_count(), 4);
    }
    assert_eq!(cache.stats().occupied_area, cache.stats().total_area);

    // Everything is still live, so the automatic compaction cannot help.
    let extra = glyph(9, 0, 16, 16);
    let report = cache.insert_batch(&mut cx, [extra.clone()]).unwrap();
    assert!(report.compacted());
    assert!(matches!(
        report.outcome(extra.key()),
        Some(InsertOutcome::Rejected(err)) if err.kind() == ErrorKind::AtlasExhausted
    ));
    assert!(!cache.contains(extra.key()));

    cx.remove_font(0);
    cx.remove_font(1);
    let summary = cache.compact(&cx).unwrap();
    assert_eq!(summary.evicted, 8);
    assert_eq!(summary.repacked, 8);
    assert_live_set_resident(&cache, &cx);

    let report = cache.insert_batch(&mut cx, [extra.clone()]).unwrap();
    assert!(!report.compacted());
    assert!(report.is_complete());
    assert!(cache.contains(extra.key()));
    assert_atlas_consistent(&cache);
}

#[test]
fn scenario_glyph_wider_than_sheet() {
    let mut cache = fixed_cache(32, 1);
    let mut cx = FontContext::new();
    cache.insert_batch(&mut cx, [glyph(0, 1, 8, 8)]).unwrap();
    let shelves_before = cache.shelves(0).unwrap().to_vec();
    let uploads_before = cache.stats().uploads;

    let report = cache.insert_batch(&mut cx, [glyph(0, 2, 33, 4)]).unwrap();
    let err = report.into_result().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::GlyphTooLarge);
    assert_eq!(err.key(), Some(GlyphKey::new(0, 2)));
    assert_eq!(cache.shelves(0).unwrap(), shelves_before.as_slice());
    assert_eq!(cache.stats().uploads, uploads_before);
    assert_eq!(cache.stats().compactions, 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn scenario_frame_loop_with_proactive_compaction() {
    let mut cache = fixed_cache(64, 1);
    let mut cx = FontContext::new();

    // Each frame shows a different page of text in a different font and
    // compacts at the frame boundary.
    for frame in 0..10_u64 {
        cx.remove_font(frame.wrapping_sub(1));
        let report = cache
            .insert_batch(&mut cx, glyphs(frame, 0, 12, 12, 14))
            .unwrap();
        assert!(report.is_complete(), "frame {frame} did not fit");
        cache.compact(&cx).unwrap();

        assert_eq!(cache.len(), 12);
        assert_live_set_resident(&cache, &cx);
        assert_atlas_consistent(&cache);
    }
}
