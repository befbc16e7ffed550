// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking which glyphs the application still wants.
//!
//! Residency in the atlas and liveness are separate indices over the same
//! [`Glyph`]s. Compaction keeps exactly the glyphs that are live and evicts
//! the rest, so no recency tracking is needed.

use alloc::rc::Rc;
use alloc::vec::Vec;
use foldhash::fast::FixedState;
use hashbrown::HashMap;

use crate::glyph::{Glyph, GlyphKey};

/// The set of glyphs still referenced by the application.
///
/// Passed explicitly to every cache operation that needs it.
pub trait LivenessProvider {
    /// Take a strong reference to every live glyph.
    ///
    /// The returned references keep the glyphs alive for as long as the caller
    /// holds them, independently of later changes to the provider.
    fn snapshot_live_glyphs(&self) -> Vec<Rc<Glyph>>;

    /// Record that a freshly inserted glyph is live.
    ///
    /// Takes over the reference it is given.
    fn register_live(&mut self, glyph: Rc<Glyph>);
}

/// The liveness index of a single font: glyph id to glyph.
#[derive(Debug)]
pub struct FontGlyphs {
    font_id: u64,
    glyphs: HashMap<u32, Rc<Glyph>, FixedState>,
}

impl FontGlyphs {
    fn new(font_id: u64) -> Self {
        Self {
            font_id,
            glyphs: HashMap::default(),
        }
    }

    /// The font these glyphs belong to.
    #[inline]
    pub fn font_id(&self) -> u64 {
        self.font_id
    }

    /// Look up a live glyph.
    pub fn get(&self, glyph_id: u32) -> Option<&Rc<Glyph>> {
        self.glyphs.get(&glyph_id)
    }

    /// Whether the glyph is live.
    pub fn contains(&self, glyph_id: u32) -> bool {
        self.glyphs.contains_key(&glyph_id)
    }

    /// Withdraw the font's reference to a glyph.
    ///
    /// The glyph stays in the atlas until the next compaction.
    pub fn remove(&mut self, glyph_id: u32) -> Option<Rc<Glyph>> {
        self.glyphs.remove(&glyph_id)
    }

    /// Withdraw every reference held by this font.
    pub fn clear(&mut self) {
        self.glyphs.clear();
    }

    /// Number of live glyphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether no glyph of this font is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Iterate over the live glyphs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Glyph>> + '_ {
        self.glyphs.values()
    }

    fn insert(&mut self, glyph: Rc<Glyph>) -> Option<Rc<Glyph>> {
        self.glyphs.insert(glyph.key().glyph_id, glyph)
    }
}

/// Per-font liveness indices for every loaded font.
///
/// Fonts are kept in the order they were added.
#[derive(Debug, Default)]
pub struct FontContext {
    fonts: Vec<FontGlyphs>,
}

impl FontContext {
    /// Creates a context with no fonts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a font, returning its glyph set (the existing one if already loaded).
    pub fn add_font(&mut self, font_id: u64) -> &mut FontGlyphs {
        let index = match self.position(font_id) {
            Some(index) => index,
            None => {
                self.fonts.push(FontGlyphs::new(font_id));
                self.fonts.len() - 1
            }
        };
        &mut self.fonts[index]
    }

    /// Unload a font, withdrawing every liveness reference it held.
    pub fn remove_font(&mut self, font_id: u64) -> Option<FontGlyphs> {
        let index = self.position(font_id)?;
        Some(self.fonts.remove(index))
    }

    /// Look up a font.
    pub fn font(&self, font_id: u64) -> Option<&FontGlyphs> {
        self.fonts.iter().find(|font| font.font_id == font_id)
    }

    /// Look up a font for modification.
    pub fn font_mut(&mut self, font_id: u64) -> Option<&mut FontGlyphs> {
        self.fonts.iter_mut().find(|font| font.font_id == font_id)
    }

    /// All loaded fonts.
    pub fn fonts(&self) -> &[FontGlyphs] {
        &self.fonts
    }

    /// Mark a glyph live in its font, adding the font if needed.
    ///
    /// Returns the glyph previously registered under the same key, if any.
    pub fn insert(&mut self, glyph: Rc<Glyph>) -> Option<Rc<Glyph>> {
        self.add_font(glyph.key().font_id).insert(glyph)
    }

    /// Withdraw the liveness reference for `key`.
    pub fn release(&mut self, key: GlyphKey) -> Option<Rc<Glyph>> {
        self.font_mut(key.font_id)?.remove(key.glyph_id)
    }

    /// Whether `key` is live in any font.
    pub fn is_live(&self, key: GlyphKey) -> bool {
        self.font(key.font_id)
            .is_some_and(|font| font.contains(key.glyph_id))
    }

    /// Total number of live glyphs across all fonts.
    pub fn live_count(&self) -> usize {
        self.fonts.iter().map(FontGlyphs::len).sum()
    }

    fn position(&self, font_id: u64) -> Option<usize> {
        self.fonts.iter().position(|font| font.font_id == font_id)
    }
}

impl LivenessProvider for FontContext {
    fn snapshot_live_glyphs(&self) -> Vec<Rc<Glyph>> {
        let mut live = Vec::with_capacity(self.live_count());
        for font in &self.fonts {
            live.extend(font.iter().cloned());
        }
        live
    }

    fn register_live(&mut self, glyph: Rc<Glyph>) {
        if let Some(previous) = self.insert(glyph) {
            log::trace!(
                "replaced live glyph {}:{}",
                previous.key().font_id,
                previous.key().glyph_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::GlyphMetrics;
    use alloc::vec;

    fn glyph(font_id: u64, glyph_id: u32) -> Rc<Glyph> {
        Glyph::new(
            GlyphKey::new(font_id, glyph_id),
            1,
            1,
            GlyphMetrics::default(),
            vec![0_u8],
        )
    }

    #[test]
    fn insert_creates_font_on_demand() {
        let mut cx = FontContext::new();
        cx.insert(glyph(7, 1));
        assert_eq!(cx.fonts().len(), 1);
        assert_eq!(cx.fonts()[0].font_id(), 7);
        assert!(cx.is_live(GlyphKey::new(7, 1)));
        assert!(!cx.is_live(GlyphKey::new(7, 2)));
    }

    #[test]
    fn membership_holds_one_reference() {
        let mut cx = FontContext::new();
        let g = glyph(1, 1);
        cx.register_live(g.clone());
        assert_eq!(Rc::strong_count(&g), 2);

        let released = cx.release(g.key()).unwrap();
        drop(released);
        assert_eq!(Rc::strong_count(&g), 1);
    }

    #[test]
    fn snapshot_covers_every_font() {
        let mut cx = FontContext::new();
        cx.insert(glyph(1, 1));
        cx.insert(glyph(1, 2));
        cx.insert(glyph(2, 1));

        let snapshot = cx.snapshot_live_glyphs();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(cx.live_count(), 3);
        // Each snapshot entry is an extra reference.
        assert!(snapshot.iter().all(|g| Rc::strong_count(g) == 2));
    }

    #[test]
    fn remove_font_withdraws_its_glyphs() {
        let mut cx = FontContext::new();
        let g = glyph(3, 9);
        cx.insert(g.clone());
        cx.add_font(4);

        let removed = cx.remove_font(3).unwrap();
        assert_eq!(removed.len(), 1);
        drop(removed);
        assert_eq!(Rc::strong_count(&g), 1);
        assert!(!cx.is_live(g.key()));
        assert_eq!(cx.fonts().len(), 1);
    }

    #[test]
    fn add_font_is_idempotent() {
        let mut cx = FontContext::new();
        cx.add_font(5);
        cx.add_font(5);
        assert_eq!(cx.fonts().len(), 1);
    }
}
