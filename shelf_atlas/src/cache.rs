// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph atlas cache with shelf packing and liveness-driven compaction.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::fmt::{Debug, Formatter};
use foldhash::fast::FixedState;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::config::AtlasConfig;
use crate::error::Error;
use crate::glyph::{Glyph, GlyphKey, Placement};
use crate::liveness::LivenessProvider;
use crate::report::{InsertOutcome, InsertReport, InsertResult};
use crate::shelf::{AllocError, Shelf, ShelfAllocator};
use crate::texture::TextureBackend;

/// One texture page and the shelves packed into it.
struct Sheet<T> {
    texture: T,
    shelves: ShelfAllocator,
}

/// Glyph atlas cache.
///
/// Owns its sheets, their textures (through the backend `B`), and the
/// residency index. Each resident glyph is held by one strong reference in the
/// index; the application's [`LivenessProvider`] holds another for as long as it
/// wants the glyph.
///
/// Dropping the cache releases every residency reference and destroys every
/// sheet texture.
pub struct AtlasCache<B: TextureBackend> {
    backend: B,
    config: AtlasConfig,
    /// Most applications fit in a single sheet, so keep one inline.
    sheets: SmallVec<[Sheet<B::Texture>; 1]>,
    index: HashMap<GlyphKey, Rc<Glyph>, FixedState>,
    /// Set when a compaction failed half way; the shelves no longer match the index.
    poisoned: bool,
    compactions: u64,
    evicted_glyphs: u64,
    uploads: u64,
    uploaded_bytes: u64,
}

/// What a compaction did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompactionSummary {
    /// Resident glyphs that were not live and got dropped from the atlas.
    pub evicted: usize,
    /// Live glyphs packed back into the atlas.
    pub repacked: usize,
    /// Sheets added because the live set no longer fit.
    pub sheets_added: usize,
}

/// Statistics about the atlas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AtlasStats {
    /// Number of sheets.
    pub sheets: usize,
    /// Number of shelves across all sheets.
    pub shelves: usize,
    /// Number of resident glyphs.
    pub resident_glyphs: usize,
    /// Pixel area covered by resident glyphs.
    pub occupied_area: u64,
    /// Pixel area of all sheets together.
    pub total_area: u64,
    /// Compactions since the last [`AtlasCache::clear_stats`].
    pub compactions: u64,
    /// Glyphs evicted since the last [`AtlasCache::clear_stats`].
    pub evicted_glyphs: u64,
    /// Glyph uploads since the last [`AtlasCache::clear_stats`].
    pub uploads: u64,
    /// Bytes uploaded since the last [`AtlasCache::clear_stats`].
    pub uploaded_bytes: u64,
}

impl<B: TextureBackend> AtlasCache<B> {
    /// Creates a cache with `config.initial_sheet_count` empty sheets.
    ///
    /// If the backend fails part way, the textures created so far are destroyed.
    pub fn new(backend: B, config: AtlasConfig) -> Result<Self, Error> {
        config.validate()?;
        let mut cache = Self {
            backend,
            config,
            sheets: SmallVec::new(),
            index: HashMap::default(),
            poisoned: false,
            compactions: 0,
            evicted_glyphs: 0,
            uploads: 0,
            uploaded_bytes: 0,
        };
        for _ in 0..config.initial_sheet_count {
            cache.push_sheet()?;
        }
        Ok(cache)
    }

    /// Place a batch of glyphs.
    ///
    /// Glyphs are packed tallest first. Each newly placed glyph is uploaded,
    /// added to the residency index, and handed to `live` through
    /// [`LivenessProvider::register_live`]; the caller's reference is consumed.
    ///
    /// When a glyph does not fit, the cache compacts once per batch, then tries
    /// to grow by a sheet. The first glyph that still does not fit is rejected
    /// with [`ErrorKind::AtlasExhausted`] and later glyphs that do not fit in
    /// the remaining space are reported as [`InsertOutcome::Deferred`].
    ///
    /// Per-glyph problems are reported in the returned [`InsertReport`]. An
    /// `Err` means the batch was abandoned: compaction failed (the cache is now
    /// poisoned), the texture backend failed, or the cache was already poisoned.
    ///
    /// [`ErrorKind::AtlasExhausted`]: crate::ErrorKind::AtlasExhausted
    pub fn insert_batch<L>(
        &mut self,
        live: &mut L,
        glyphs: impl IntoIterator<Item = Rc<Glyph>>,
    ) -> Result<InsertReport, Error>
    where
        L: LivenessProvider + ?Sized,
    {
        self.ensure_usable()?;

        let mut batch: Vec<(usize, Rc<Glyph>)> = glyphs.into_iter().enumerate().collect();
        let keys: Vec<GlyphKey> = batch.iter().map(|(_, glyph)| glyph.key()).collect();
        let mut outcomes: Vec<Option<InsertOutcome>> = batch.iter().map(|_| None).collect();
        // Stable, so equally tall glyphs keep their submission order.
        batch.sort_by_key(|(_, glyph)| Reverse(glyph.height()));

        let mut compacted = false;
        let mut exhausted = false;
        let mut sheets_added = 0;

        for (slot, glyph) in batch {
            let key = glyph.key();
            let outcome = 'outcome: {
                if self.index.contains_key(&key) {
                    break 'outcome InsertOutcome::Duplicate;
                }
                if glyph.is_placed() {
                    break 'outcome InsertOutcome::Rejected(Error::placed_elsewhere(key));
                }
                if let Err(err) = self.check_glyph(&glyph) {
                    break 'outcome InsertOutcome::Rejected(err);
                }

                let mut placement = self.place(&glyph)?;
                if placement.is_none() && exhausted {
                    break 'outcome InsertOutcome::Deferred;
                }
                if placement.is_none() && !compacted {
                    compacted = true;
                    self.compact(&*live)?;
                    placement = self.place(&glyph)?;
                }
                if placement.is_none() && self.try_grow()? {
                    sheets_added += 1;
                    placement = self.place(&glyph)?;
                    if placement.is_none() {
                        // Not even an empty sheet can take it.
                        break 'outcome InsertOutcome::Rejected(Error::glyph_too_large(key));
                    }
                }

                let Some(placement) = placement else {
                    exhausted = true;
                    log::warn!(
                        "atlas exhausted placing glyph {}:{} ({}x{})",
                        key.font_id,
                        key.glyph_id,
                        glyph.width(),
                        glyph.height()
                    );
                    break 'outcome InsertOutcome::Rejected(Error::atlas_exhausted(key));
                };

                self.index.insert(key, glyph.clone());
                live.register_live(glyph);
                InsertOutcome::Placed(placement)
            };
            outcomes[slot] = Some(outcome);
        }

        let results = keys
            .into_iter()
            .zip(outcomes)
            .map(|(key, outcome)| {
                let mut outcome = outcome.unwrap_or(InsertOutcome::Deferred);
                // A compaction may have moved glyphs placed earlier in the batch.
                if let InsertOutcome::Placed(placement) = &mut outcome {
                    if let Some(current) = self.index.get(&key).and_then(|g| g.placement()) {
                        *placement = current;
                    }
                }
                InsertResult { key, outcome }
            })
            .collect();

        Ok(InsertReport::new(results, compacted, sheets_added))
    }

    /// Evict every resident glyph that is not live and repack the live ones.
    ///
    /// Every shelf is dropped and the live set is packed again from scratch,
    /// tallest first, re-uploading the retained bitmaps. Glyphs that are live
    /// but were not resident become resident. Sheet textures are not cleared;
    /// stale pixels are simply overwritten by later uploads.
    ///
    /// If a live glyph cannot be repacked the cache is left half rebuilt and
    /// poisoned: this returns [`ErrorKind::CompactionFailed`] (or
    /// [`ErrorKind::Backend`]) and every later call returns
    /// [`ErrorKind::Poisoned`] until [`clear`](Self::clear).
    ///
    /// [`ErrorKind::CompactionFailed`]: crate::ErrorKind::CompactionFailed
    /// [`ErrorKind::Backend`]: crate::ErrorKind::Backend
    /// [`ErrorKind::Poisoned`]: crate::ErrorKind::Poisoned
    pub fn compact<L>(&mut self, live: &L) -> Result<CompactionSummary, Error>
    where
        L: LivenessProvider + ?Sized,
    {
        self.ensure_usable()?;

        // Holding the snapshot keeps every live glyph alive through the rebuild.
        let mut live_set = live.snapshot_live_glyphs();
        log::debug!(
            "compacting atlas: {} resident, {} live",
            self.index.len(),
            live_set.len()
        );

        let live_keys: HashSet<GlyphKey, FixedState> =
            live_set.iter().map(|glyph| glyph.key()).collect();
        let evicted = self
            .index
            .keys()
            .filter(|key| !live_keys.contains(*key))
            .count();

        for glyph in self.index.values() {
            glyph.set_placement(None);
        }
        // Glyphs that only the index referenced are freed here.
        self.index.clear();
        for sheet in &mut self.sheets {
            sheet.shelves.clear();
        }

        live_set.sort_by(|a, b| {
            b.height()
                .cmp(&a.height())
                .then_with(|| a.key().cmp(&b.key()))
        });

        let summary = match self.repack(&live_set) {
            Ok((repacked, sheets_added)) => CompactionSummary {
                evicted,
                repacked,
                sheets_added,
            },
            Err(err) => {
                self.poisoned = true;
                log::warn!("compaction failed, atlas cache is unusable: {err}");
                return Err(err);
            }
        };

        self.compactions += 1;
        self.evicted_glyphs += evicted as u64;
        log::debug!(
            "compaction done: evicted {}, repacked {}, {} sheets",
            summary.evicted,
            summary.repacked,
            self.sheets.len()
        );
        Ok(summary)
    }

    /// Look up a resident glyph.
    pub fn find(&self, key: GlyphKey) -> Option<&Rc<Glyph>> {
        self.index.get(&key)
    }

    /// Look up a resident glyph by its glyph and font identifiers.
    pub fn find_by_ids(&self, glyph_id: u32, font_id: u64) -> Option<&Rc<Glyph>> {
        self.find(GlyphKey::new(font_id, glyph_id))
    }

    /// Whether a glyph is resident.
    pub fn contains(&self, key: GlyphKey) -> bool {
        self.index.contains_key(&key)
    }

    /// Iterate over resident glyphs in unspecified order.
    pub fn glyphs(&self) -> impl Iterator<Item = &Rc<Glyph>> + '_ {
        self.index.values()
    }

    /// Number of resident glyphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no glyph is resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Add an empty sheet, returning its index.
    ///
    /// Works regardless of [`AtlasConfig::auto_grow`], up to
    /// [`AtlasConfig::max_sheets`].
    pub fn add_sheet(&mut self) -> Result<usize, Error> {
        self.ensure_usable()?;
        if self.sheets.len() >= self.config.max_sheets {
            return Err(Error::sheet_limit_reached(self.config.max_sheets));
        }
        self.push_sheet()
    }

    /// Drop every resident glyph and shelf, keeping the sheets.
    ///
    /// This also makes a poisoned cache usable again.
    pub fn clear(&mut self) {
        for glyph in self.index.values() {
            glyph.set_placement(None);
        }
        self.index.clear();
        for sheet in &mut self.sheets {
            sheet.shelves.clear();
        }
        self.poisoned = false;
    }

    /// Number of sheets.
    #[inline]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// The texture backing a sheet.
    pub fn texture(&self, sheet: usize) -> Option<&B::Texture> {
        self.sheets.get(sheet).map(|sheet| &sheet.texture)
    }

    /// The shelves of a sheet, in stacking order.
    pub fn shelves(&self, sheet: usize) -> Option<&[Shelf]> {
        self.sheets.get(sheet).map(|sheet| sheet.shelves.shelves())
    }

    /// The configuration the cache was created with.
    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// The texture backend.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The texture backend, mutably.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether an earlier compaction failure left the cache unusable.
    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Current statistics.
    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            sheets: self.sheets.len(),
            shelves: self
                .sheets
                .iter()
                .map(|sheet| sheet.shelves.shelves().len())
                .sum(),
            resident_glyphs: self.index.len(),
            occupied_area: self
                .sheets
                .iter()
                .map(|sheet| sheet.shelves.occupied_area())
                .sum(),
            total_area: self.config.sheet_area() * self.sheets.len() as u64,
            compactions: self.compactions,
            evicted_glyphs: self.evicted_glyphs,
            uploads: self.uploads,
            uploaded_bytes: self.uploaded_bytes,
        }
    }

    /// Reset the compaction, eviction, and upload counters.
    pub fn clear_stats(&mut self) {
        self.compactions = 0;
        self.evicted_glyphs = 0;
        self.uploads = 0;
        self.uploaded_bytes = 0;
    }

    fn ensure_usable(&self) -> Result<(), Error> {
        if self.poisoned {
            Err(Error::poisoned())
        } else {
            Ok(())
        }
    }

    /// Reject glyphs that could never be placed, before touching any sheet.
    fn check_glyph(&self, glyph: &Glyph) -> Result<(), Error> {
        let key = glyph.key();
        if glyph.is_empty() {
            return Err(Error::empty_glyph(key));
        }
        let size = self.config.sheet_size;
        if glyph.width() > size || glyph.height() > size {
            return Err(Error::glyph_too_large(key));
        }
        let expected = self.config.format.bitmap_len(glyph.width(), glyph.height());
        if Some(glyph.pixels().len()) != expected {
            return Err(Error::invalid_bitmap(key));
        }
        Ok(())
    }

    /// Try every sheet in order and upload into the first one that accepts the glyph.
    ///
    /// `Ok(None)` means no sheet had room.
    fn place(&mut self, glyph: &Glyph) -> Result<Option<Placement>, Error> {
        let key = glyph.key();
        let (width, height) = (glyph.width(), glyph.height());
        let format = self.config.format;

        for (index, sheet) in self.sheets.iter_mut().enumerate() {
            let alloc = match sheet.shelves.allocate(key, width, height) {
                Ok(alloc) => alloc,
                Err(AllocError::OutOfRoom) => continue,
                Err(AllocError::TooWide) => {
                    log::trace!(
                        "glyph {}:{} is too wide for sheet {index}",
                        key.font_id,
                        key.glyph_id
                    );
                    continue;
                }
            };

            let uploaded = self.backend.sub_upload(
                &sheet.texture,
                format,
                [alloc.x, alloc.y],
                [width, height],
                glyph.pixels(),
            );
            if let Err(err) = uploaded {
                sheet.shelves.release_last(&alloc);
                return Err(Error::backend(err, Some(index), Some(key)));
            }
            self.uploads += 1;
            self.uploaded_bytes += glyph.pixels().len() as u64;

            log::trace!(
                "inserted glyph {}:{} into {} shelf {} of sheet {index}",
                key.font_id,
                key.glyph_id,
                if alloc.new_shelf { "new" } else { "existing" },
                alloc.shelf
            );

            let placement = Placement {
                sheet: index,
                shelf: alloc.shelf,
                x: alloc.x,
                y: alloc.y,
                width,
                height,
            };
            glyph.set_placement(Some(placement));
            return Ok(Some(placement));
        }
        Ok(None)
    }

    /// Pack a sorted live set into the freshly cleared sheets.
    ///
    /// Returns the number of glyphs packed and the number of sheets added.
    fn repack(&mut self, live_set: &[Rc<Glyph>]) -> Result<(usize, usize), Error> {
        let mut repacked = 0;
        let mut sheets_added = 0;
        for glyph in live_set {
            let key = glyph.key();
            if glyph.is_empty() || self.index.contains_key(&key) {
                continue;
            }
            if glyph.is_placed() {
                log::warn!(
                    "live glyph {}:{} is resident in another cache, not repacking it",
                    key.font_id,
                    key.glyph_id
                );
                continue;
            }
            if self.check_glyph(glyph).is_err() {
                return Err(Error::compaction_failed(key));
            }
            let mut placement = self.place(glyph)?;
            if placement.is_none() && self.try_grow()? {
                sheets_added += 1;
                placement = self.place(glyph)?;
            }
            if placement.is_none() {
                return Err(Error::compaction_failed(key));
            }
            self.index.insert(key, glyph.clone());
            repacked += 1;
        }
        Ok((repacked, sheets_added))
    }

    /// Add a sheet if the configuration allows automatic growth.
    fn try_grow(&mut self) -> Result<bool, Error> {
        if !self.config.auto_grow || self.sheets.len() >= self.config.max_sheets {
            return Ok(false);
        }
        self.push_sheet()?;
        Ok(true)
    }

    fn push_sheet(&mut self) -> Result<usize, Error> {
        let index = self.sheets.len();
        let texture = self
            .backend
            .create_texture(self.config.format, self.config.sheet_size, None)
            .map_err(|err| Error::backend(err, Some(index), None))?;
        self.sheets.push(Sheet {
            texture,
            shelves: ShelfAllocator::new(
                self.config.sheet_size,
                self.config.max_shelves_per_sheet,
                self.config.max_glyphs_per_shelf,
            ),
        });
        log::debug!("added atlas sheet {index}");
        Ok(index)
    }
}

impl<B: TextureBackend> Drop for AtlasCache<B> {
    fn drop(&mut self) {
        for glyph in self.index.values() {
            glyph.set_placement(None);
        }
        self.index.clear();
        for sheet in self.sheets.drain(..) {
            self.backend.destroy_texture(sheet.texture);
        }
    }
}

impl<B: TextureBackend> Debug for AtlasCache<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtlasCache")
            .field("config", &self.config)
            .field("sheets", &self.sheets.len())
            .field("resident", &self.index.len())
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}
