// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-glyph results of a batch insertion.

use alloc::vec::Vec;

use crate::error::Error;
use crate::glyph::{GlyphKey, Placement};

/// What happened to one glyph of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The glyph was packed, uploaded, and registered.
    Placed(Placement),
    /// A glyph with the same key was already resident; nothing changed.
    Duplicate,
    /// Skipped because the atlas ran out of room earlier in the same batch.
    ///
    /// Retry on a later call, once something has freed space.
    Deferred,
    /// The glyph cannot be placed.
    Rejected(Error),
}

impl InsertOutcome {
    /// Whether the glyph is resident after the call.
    #[inline]
    pub fn is_resident(&self) -> bool {
        matches!(self, Self::Placed(_) | Self::Duplicate)
    }
}

/// A glyph key and its outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertResult {
    /// The glyph the outcome is for.
    pub key: GlyphKey,
    /// What happened to it.
    pub outcome: InsertOutcome,
}

/// Results of [`AtlasCache::insert_batch`](crate::AtlasCache::insert_batch),
/// in the order the glyphs were submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    results: Vec<InsertResult>,
    compacted: bool,
    sheets_added: usize,
}

impl InsertReport {
    pub(crate) fn new(results: Vec<InsertResult>, compacted: bool, sheets_added: usize) -> Self {
        Self {
            results,
            compacted,
            sheets_added,
        }
    }

    /// All results in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &InsertResult> + '_ {
        self.results.iter()
    }

    /// Number of submitted glyphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch was empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The outcome of the first submitted glyph with `key`.
    pub fn outcome(&self, key: GlyphKey) -> Option<&InsertOutcome> {
        self.results
            .iter()
            .find(|result| result.key == key)
            .map(|result| &result.outcome)
    }

    /// Number of glyphs that were newly placed.
    pub fn placed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, InsertOutcome::Placed(_)))
    }

    /// Number of glyphs skipped as already resident.
    pub fn duplicate_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, InsertOutcome::Duplicate))
    }

    /// Number of glyphs deferred to a later call.
    pub fn deferred_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, InsertOutcome::Deferred))
    }

    /// Number of glyphs rejected outright.
    pub fn rejected_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, InsertOutcome::Rejected(_)))
    }

    /// Whether every submitted glyph is resident.
    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|result| result.outcome.is_resident())
    }

    /// Whether the batch triggered a compaction.
    #[inline]
    pub fn compacted(&self) -> bool {
        self.compacted
    }

    /// Number of sheets added while handling the batch.
    #[inline]
    pub fn sheets_added(&self) -> usize {
        self.sheets_added
    }

    /// Collapse the report into a single result.
    ///
    /// Returns the first rejection, or [`ErrorKind::AtlasExhausted`] for the
    /// first deferred glyph if nothing was rejected.
    ///
    /// [`ErrorKind::AtlasExhausted`]: crate::ErrorKind::AtlasExhausted
    pub fn into_result(self) -> Result<(), Error> {
        let mut deferred = None;
        for result in self.results {
            match result.outcome {
                InsertOutcome::Rejected(err) => return Err(err),
                InsertOutcome::Deferred if deferred.is_none() => deferred = Some(result.key),
                _ => {}
            }
        }
        match deferred {
            Some(key) => Err(Error::atlas_exhausted(key)),
            None => Ok(()),
        }
    }

    fn count(&self, f: impl Fn(&InsertOutcome) -> bool) -> usize {
        self.results.iter().filter(|result| f(&result.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use alloc::vec;

    fn placement() -> Placement {
        Placement {
            sheet: 0,
            shelf: 0,
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn counts_by_outcome() {
        let report = InsertReport::new(
            vec![
                InsertResult {
                    key: GlyphKey::new(0, 1),
                    outcome: InsertOutcome::Placed(placement()),
                },
                InsertResult {
                    key: GlyphKey::new(0, 1),
                    outcome: InsertOutcome::Duplicate,
                },
                InsertResult {
                    key: GlyphKey::new(0, 2),
                    outcome: InsertOutcome::Deferred,
                },
            ],
            true,
            0,
        );
        assert_eq!(report.len(), 3);
        assert_eq!(report.placed_count(), 1);
        assert_eq!(report.duplicate_count(), 1);
        assert_eq!(report.deferred_count(), 1);
        assert_eq!(report.rejected_count(), 0);
        assert!(!report.is_complete());
        assert!(report.compacted());
        assert_eq!(
            report.outcome(GlyphKey::new(0, 1)),
            Some(&InsertOutcome::Placed(placement()))
        );
    }

    #[test]
    fn into_result_prefers_rejections() {
        let report = InsertReport::new(
            vec![
                InsertResult {
                    key: GlyphKey::new(0, 1),
                    outcome: InsertOutcome::Deferred,
                },
                InsertResult {
                    key: GlyphKey::new(0, 2),
                    outcome: InsertOutcome::Rejected(Error::glyph_too_large(GlyphKey::new(0, 2))),
                },
            ],
            false,
            0,
        );
        let err = report.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GlyphTooLarge);
    }

    #[test]
    fn deferred_glyphs_surface_as_exhaustion() {
        let report = InsertReport::new(
            vec![InsertResult {
                key: GlyphKey::new(4, 4),
                outcome: InsertOutcome::Deferred,
            }],
            true,
            0,
        );
        let err = report.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AtlasExhausted);
        assert_eq!(err.key(), Some(GlyphKey::new(4, 4)));
    }
}
