// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas configuration.

use crate::error::Error;

/// Pixel format shared by every sheet of a cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single-channel coverage, one byte per pixel.
    #[default]
    Alpha8,
    /// Four-channel color, four bytes per pixel.
    Rgba8,
}

impl PixelFormat {
    /// Number of bytes used by a single pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha8 => 1,
            Self::Rgba8 => 4,
        }
    }

    /// Number of bytes in a tightly packed `width` x `height` bitmap.
    ///
    /// Returns `None` if the size does not fit in `usize`.
    #[inline]
    pub fn bitmap_len(self, width: u32, height: u32) -> Option<usize> {
        usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?
            .checked_mul(self.bytes_per_pixel())
    }
}

/// Configuration for an [`AtlasCache`](crate::AtlasCache).
///
/// Fixed for the lifetime of the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasConfig {
    /// Side length of each square sheet, in pixels.
    pub sheet_size: u32,
    /// Number of sheets created up front.
    pub initial_sheet_count: usize,
    /// Maximum number of sheets the cache may ever hold.
    pub max_sheets: usize,
    /// Whether insertion and compaction may add sheets on their own.
    ///
    /// [`AtlasCache::add_sheet`](crate::AtlasCache::add_sheet) still works when
    /// this is `false`.
    pub auto_grow: bool,
    /// Pixel format of every sheet.
    pub format: PixelFormat,
    /// Maximum number of shelves stacked in a single sheet.
    pub max_shelves_per_sheet: usize,
    /// Maximum number of glyphs placed on a single shelf.
    pub max_glyphs_per_shelf: usize,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            sheet_size: 1024,
            initial_sheet_count: 1,
            max_sheets: 8,
            auto_grow: true,
            format: PixelFormat::Alpha8,
            max_shelves_per_sheet: 64,
            max_glyphs_per_shelf: 256,
        }
    }
}

impl AtlasConfig {
    /// A configuration with `sheet_count` sheets of `sheet_size` pixels that never grows.
    pub fn fixed(sheet_size: u32, sheet_count: usize, format: PixelFormat) -> Self {
        Self {
            sheet_size,
            initial_sheet_count: sheet_count,
            max_sheets: sheet_count,
            auto_grow: false,
            format,
            ..Default::default()
        }
    }

    /// Check that the configuration describes a usable atlas.
    pub fn validate(&self) -> Result<(), Error> {
        let reason = if self.sheet_size == 0 {
            "sheet size must be non-zero"
        } else if self.initial_sheet_count == 0 {
            "at least one sheet is required"
        } else if self.max_sheets < self.initial_sheet_count {
            "max sheets is smaller than the initial sheet count"
        } else if self.max_shelves_per_sheet == 0 {
            "sheets must allow at least one shelf"
        } else if self.max_glyphs_per_shelf == 0 {
            "shelves must allow at least one glyph"
        } else if self
            .format
            .bitmap_len(self.sheet_size, self.sheet_size)
            .is_none_or(|len| len > isize::MAX as usize)
        {
            "sheet size is too large to address"
        } else {
            return Ok(());
        };
        Err(Error::invalid_config(reason))
    }

    /// Total pixel area of a single sheet.
    #[inline]
    pub(crate) fn sheet_area(&self) -> u64 {
        u64::from(self.sheet_size) * u64::from(self.sheet_size)
    }
}
