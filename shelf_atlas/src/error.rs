// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::glyph::GlyphKey;
use crate::texture::TextureError;

/// Rich error type for atlas operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the glyph, sheet, or backend
/// failure involved, when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The non-exhaustive category describing this error.
    kind: ErrorKind,

    /// The glyph being placed when the error occurred.
    key: Option<GlyphKey>,

    /// The sheet involved, for size and backend errors.
    sheet: Option<usize>,

    /// The underlying texture backend failure.
    texture: Option<TextureError>,

    /// Which configuration constraint was violated.
    reason: Option<&'static str>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The glyph that could not be handled, if any.
    pub fn key(&self) -> Option<GlyphKey> {
        self.key
    }

    /// The sheet involved, if any.
    pub fn sheet(&self) -> Option<usize> {
        self.sheet
    }

    /// The texture backend failure, for [`ErrorKind::Backend`].
    pub fn texture_error(&self) -> Option<&TextureError> {
        self.texture.as_ref()
    }

    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            sheet: None,
            texture: None,
            reason: None,
        }
    }

    pub(crate) fn invalid_config(reason: &'static str) -> Self {
        Self {
            reason: Some(reason),
            ..Self::new(ErrorKind::InvalidConfig)
        }
    }

    pub(crate) fn glyph_too_large(key: GlyphKey) -> Self {
        Self {
            key: Some(key),
            ..Self::new(ErrorKind::GlyphTooLarge)
        }
    }

    pub(crate) fn empty_glyph(key: GlyphKey) -> Self {
        Self {
            key: Some(key),
            ..Self::new(ErrorKind::EmptyGlyph)
        }
    }

    pub(crate) fn invalid_bitmap(key: GlyphKey) -> Self {
        Self {
            key: Some(key),
            ..Self::new(ErrorKind::InvalidBitmap)
        }
    }

    pub(crate) fn placed_elsewhere(key: GlyphKey) -> Self {
        Self {
            key: Some(key),
            ..Self::new(ErrorKind::PlacedElsewhere)
        }
    }

    pub(crate) fn atlas_exhausted(key: GlyphKey) -> Self {
        Self {
            key: Some(key),
            ..Self::new(ErrorKind::AtlasExhausted)
        }
    }

    pub(crate) fn sheet_limit_reached(max_sheets: usize) -> Self {
        Self {
            sheet: Some(max_sheets),
            ..Self::new(ErrorKind::SheetLimitReached)
        }
    }

    pub(crate) fn compaction_failed(key: GlyphKey) -> Self {
        Self {
            key: Some(key),
            ..Self::new(ErrorKind::CompactionFailed)
        }
    }

    pub(crate) fn backend(
        error: TextureError,
        sheet: Option<usize>,
        key: Option<GlyphKey>,
    ) -> Self {
        Self {
            key,
            sheet,
            texture: Some(error),
            ..Self::new(ErrorKind::Backend)
        }
    }

    pub(crate) fn poisoned() -> Self {
        Self::new(ErrorKind::Poisoned)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::InvalidConfig => write!(
                f,
                "invalid atlas configuration: {}",
                self.reason.unwrap_or("unknown constraint")
            ),
            ErrorKind::GlyphTooLarge => {
                write!(f, "glyph ")?;
                write_key(f, self.key)?;
                write!(f, " exceeds the sheet size")
            }
            ErrorKind::EmptyGlyph => {
                write!(f, "glyph ")?;
                write_key(f, self.key)?;
                write!(f, " has an empty bitmap")
            }
            ErrorKind::InvalidBitmap => {
                write!(f, "glyph ")?;
                write_key(f, self.key)?;
                write!(f, " bitmap length does not match its size and format")
            }
            ErrorKind::PlacedElsewhere => {
                write!(f, "glyph ")?;
                write_key(f, self.key)?;
                write!(f, " is already placed in another atlas cache")
            }
            ErrorKind::AtlasExhausted => {
                write!(f, "atlas exhausted while placing glyph ")?;
                write_key(f, self.key)
            }
            ErrorKind::SheetLimitReached => match self.sheet {
                Some(max) => write!(f, "sheet limit of {max} reached"),
                None => write!(f, "sheet limit reached"),
            },
            ErrorKind::CompactionFailed => {
                write!(f, "compaction could not repack live glyph ")?;
                write_key(f, self.key)
            }
            ErrorKind::Backend => {
                write!(f, "texture backend failure")?;
                if let Some(sheet) = self.sheet {
                    write!(f, " on sheet {sheet}")?;
                }
                if let Some(texture) = &self.texture {
                    write!(f, ": {texture}")?;
                }
                Ok(())
            }
            ErrorKind::Poisoned => {
                write!(f, "atlas cache is unusable after a failed compaction")
            }
        }
    }
}

fn write_key(f: &mut core::fmt::Formatter<'_>, key: Option<GlyphKey>) -> core::fmt::Result {
    match key {
        Some(key) => write!(f, "{}:{}", key.font_id, key.glyph_id),
        None => write!(f, "<unknown>"),
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.texture
            .as_ref()
            .map(|e| e as &(dyn core::error::Error + 'static))
    }
}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The [`AtlasConfig`](crate::AtlasConfig) cannot describe a usable atlas.
    InvalidConfig,

    /// The glyph is wider or taller than a sheet, so it can never be placed.
    GlyphTooLarge,

    /// The glyph has zero width or height.
    EmptyGlyph,

    /// The glyph's bitmap length does not match its size in the cache's pixel format.
    InvalidBitmap,

    /// The glyph is resident in a different cache.
    PlacedElsewhere,

    /// The glyph could not be placed even after compaction and growth.
    AtlasExhausted,

    /// No more sheets can be added.
    SheetLimitReached,

    /// A live glyph could not be repacked during compaction.
    ///
    /// The cache is left partially repacked and refuses further work until it
    /// is cleared.
    CompactionFailed,

    /// The texture backend reported a failure.
    Backend,

    /// The cache was left inconsistent by an earlier compaction failure.
    Poisoned,
}
