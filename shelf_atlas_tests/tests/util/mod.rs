// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility functions and types shared across tests.

mod asserts;

pub(crate) use asserts::{assert_atlas_consistent, assert_live_set_resident};

use std::rc::Rc;

use shelf_atlas::texture::cpu::CpuTextures;
use shelf_atlas::{AtlasCache, AtlasConfig, Glyph, GlyphKey, GlyphMetrics, PixelFormat};

/// An alpha glyph whose pixels are all set to a value derived from its id.
pub(crate) fn glyph(font_id: u64, glyph_id: u32, width: u32, height: u32) -> Rc<Glyph> {
    let fill = (glyph_id % 255) as u8 + 1;
    Glyph::new(
        GlyphKey::new(font_id, glyph_id),
        width,
        height,
        GlyphMetrics {
            advance: width as i32,
            bearing_x: 0,
            bearing_y: height as i32,
        },
        vec![fill; (width * height) as usize],
    )
}

/// `count` glyphs of one font with consecutive ids starting at `first`.
pub(crate) fn glyphs(
    font_id: u64,
    first: u32,
    count: u32,
    width: u32,
    height: u32,
) -> Vec<Rc<Glyph>> {
    (first..first + count)
        .map(|glyph_id| glyph(font_id, glyph_id, width, height))
        .collect()
}

/// A CPU-backed cache with `sheets` sheets that never grows on its own.
pub(crate) fn fixed_cache(size: u32, sheets: usize) -> AtlasCache<CpuTextures> {
    AtlasCache::new(
        CpuTextures::new(),
        AtlasConfig::fixed(size, sheets, PixelFormat::Alpha8),
    )
    .unwrap()
}

/// A CPU-backed cache that may grow from one sheet up to `max_sheets`.
pub(crate) fn growable_cache(size: u32, max_sheets: usize) -> AtlasCache<CpuTextures> {
    AtlasCache::new(
        CpuTextures::new(),
        AtlasConfig {
            sheet_size: size,
            max_sheets,
            ..Default::default()
        },
    )
    .unwrap()
}
