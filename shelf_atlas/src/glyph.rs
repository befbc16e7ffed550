// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph identity, bitmap, metrics, and placement.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt::{Debug, Formatter};

/// Unique identifier for a glyph across the whole cache.
///
/// Ordering is by font first, then by glyph index, so sorting keys groups
/// glyphs of the same font together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphKey {
    /// Identifier of the font the glyph belongs to.
    pub font_id: u64,
    /// Glyph index within the font.
    pub glyph_id: u32,
}

impl GlyphKey {
    /// Creates a new key.
    #[inline]
    pub const fn new(font_id: u64, glyph_id: u32) -> Self {
        Self { font_id, glyph_id }
    }
}

/// Layout metrics reported by the rasterizer, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Horizontal advance to the next glyph origin.
    pub advance: i32,
    /// Horizontal bearing (offset from origin to left edge of glyph).
    pub bearing_x: i32,
    /// Vertical bearing (offset from origin to top edge of glyph).
    pub bearing_y: i32,
}

/// Location of a resident glyph within the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Index of the sheet holding the glyph.
    pub sheet: usize,
    /// Index of the shelf within that sheet.
    pub shelf: usize,
    /// X position in the sheet (pixels).
    pub x: u32,
    /// Y position in the sheet (pixels). Equal to the shelf's baseline.
    pub y: u32,
    /// Width of the glyph bitmap (pixels).
    pub width: u32,
    /// Height of the glyph bitmap (pixels).
    pub height: u32,
}

impl Placement {
    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// A rasterized glyph: the unit of caching.
///
/// Glyphs are always handled through [`Rc`]. Each index a glyph is registered
/// in (the cache's residency index, a font's liveness index) holds one strong
/// reference, and the glyph together with its bitmap is freed when the last one
/// is dropped.
///
/// The bitmap is row-major and tightly packed, in the pixel format of the cache
/// it is inserted into.
///
/// A glyph is resident in at most one [`AtlasCache`](crate::AtlasCache) at a
/// time. Inserting a glyph that another cache has placed is rejected with
/// [`ErrorKind::PlacedElsewhere`](crate::ErrorKind::PlacedElsewhere), and
/// compaction leaves such glyphs alone.
pub struct Glyph {
    key: GlyphKey,
    width: u32,
    height: u32,
    metrics: GlyphMetrics,
    pixels: Box<[u8]>,
    placement: Cell<Option<Placement>>,
}

impl Glyph {
    /// Creates a new, unplaced glyph.
    ///
    /// The returned handle is the caller's temporary reference; inserting it into
    /// an [`AtlasCache`](crate::AtlasCache) hands ownership to the cache and
    /// liveness indices.
    pub fn new(
        key: GlyphKey,
        width: u32,
        height: u32,
        metrics: GlyphMetrics,
        pixels: impl Into<Box<[u8]>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            key,
            width,
            height,
            metrics,
            pixels: pixels.into(),
            placement: Cell::new(None),
        })
    }

    /// The glyph's composite key.
    #[inline]
    pub fn key(&self) -> GlyphKey {
        self.key
    }

    /// Width of the bitmap in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the bitmap in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Layout metrics.
    #[inline]
    pub fn metrics(&self) -> GlyphMetrics {
        self.metrics
    }

    /// The retained bitmap.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether the bitmap covers no pixels at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Where the glyph currently lives in the atlas, if it is resident.
    #[inline]
    pub fn placement(&self) -> Option<Placement> {
        self.placement.get()
    }

    /// Whether the glyph currently has a placement.
    #[inline]
    pub fn is_placed(&self) -> bool {
        self.placement.get().is_some()
    }

    pub(crate) fn set_placement(&self, placement: Option<Placement>) {
        self.placement.set(placement);
    }
}

impl Debug for Glyph {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Glyph")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("metrics", &self.metrics)
            .field("pixels", &self.pixels.len())
            .field("placement", &self.placement.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn key_ordering_groups_by_font() {
        let mut keys = vec![
            GlyphKey::new(2, 1),
            GlyphKey::new(1, 9),
            GlyphKey::new(1, 3),
        ];
        keys.sort();
        assert_eq!(
            keys,
            [GlyphKey::new(1, 3), GlyphKey::new(1, 9), GlyphKey::new(2, 1)]
        );
    }

    #[test]
    fn new_glyph_is_unplaced() {
        let glyph = Glyph::new(
            GlyphKey::new(0, 7),
            3,
            2,
            GlyphMetrics::default(),
            vec![0_u8; 6],
        );
        assert!(!glyph.is_placed());
        assert!(!glyph.is_empty());
        assert_eq!(glyph.pixels().len(), 6);
        assert_eq!(Rc::strong_count(&glyph), 1);
    }

    #[test]
    fn zero_sized_glyph_is_empty() {
        let glyph = Glyph::new(
            GlyphKey::new(0, 32),
            0,
            12,
            GlyphMetrics::default(),
            Vec::<u8>::new(),
        );
        assert!(glyph.is_empty());
    }
}
