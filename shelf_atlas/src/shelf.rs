// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf packing within a single sheet.
//!
//! A sheet is split into horizontal shelves stacked from the top. Each shelf
//! has the height of the glyph it was opened for and is filled left to right.
//! Placement is first-fit in shelf creation order: a shorter glyph goes into
//! the first shelf that is tall enough and still has room, even if a tighter
//! shelf exists further down. Feeding glyphs tallest first keeps the waste low.

use alloc::vec::Vec;

use crate::glyph::GlyphKey;

/// A glyph's slot on a shelf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShelfSlot {
    /// The glyph occupying the slot.
    pub key: GlyphKey,
    /// Left edge within the sheet.
    pub x: u32,
    /// Width of the slot.
    pub width: u32,
    /// Height of the glyph (at most the shelf height).
    pub height: u32,
}

/// A horizontal packing row within a sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shelf {
    baseline: u32,
    height: u32,
    slots: Vec<ShelfSlot>,
}

impl Shelf {
    fn new(baseline: u32, height: u32) -> Self {
        Self {
            baseline,
            height,
            slots: Vec::new(),
        }
    }

    /// Top edge of the shelf within the sheet.
    #[inline]
    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    /// Height of the shelf.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Slots in left-to-right order.
    #[inline]
    pub fn slots(&self) -> &[ShelfSlot] {
        &self.slots
    }

    /// Right edge of the last slot, or 0 for an empty shelf.
    #[inline]
    pub fn used_width(&self) -> u32 {
        self.slots.last().map_or(0, |slot| slot.x + slot.width)
    }

    /// Number of glyphs on the shelf.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the shelf holds no glyphs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a glyph right of the last one, returning its x position.
    fn try_push(
        &mut self,
        key: GlyphKey,
        width: u32,
        height: u32,
        sheet_size: u32,
        max_glyphs: usize,
    ) -> Option<u32> {
        if self.slots.len() >= max_glyphs {
            return None;
        }
        let x = self.used_width();
        if x.checked_add(width)? > sheet_size {
            return None;
        }
        self.slots.push(ShelfSlot {
            key,
            x,
            width,
            height,
        });
        Some(x)
    }
}

/// Where the allocator put a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Allocation {
    pub(crate) shelf: usize,
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) new_shelf: bool,
}

/// Why the allocator could not place a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AllocError {
    /// No existing shelf accepts the glyph and no new shelf can be opened.
    OutOfRoom,
    /// A fresh shelf was opened but the glyph is wider than the sheet.
    TooWide,
}

/// Shelf allocator for one square sheet.
#[derive(Clone, Debug)]
pub(crate) struct ShelfAllocator {
    size: u32,
    max_shelves: usize,
    max_glyphs_per_shelf: usize,
    shelves: Vec<Shelf>,
}

impl ShelfAllocator {
    pub(crate) fn new(size: u32, max_shelves: usize, max_glyphs_per_shelf: usize) -> Self {
        Self {
            size,
            max_shelves,
            max_glyphs_per_shelf,
            shelves: Vec::new(),
        }
    }

    pub(crate) fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }

    /// Bottom edge of the shelf stack.
    pub(crate) fn stack_height(&self) -> u32 {
        self.shelves
            .last()
            .map_or(0, |shelf| shelf.baseline + shelf.height)
    }

    /// Sum of the areas of all placed glyphs.
    pub(crate) fn occupied_area(&self) -> u64 {
        self.shelves
            .iter()
            .flat_map(|shelf| shelf.slots.iter())
            .map(|slot| u64::from(slot.width) * u64::from(slot.height))
            .sum()
    }

    /// Forget every shelf. Texture contents are left alone.
    pub(crate) fn clear(&mut self) {
        self.shelves.clear();
    }

    /// Undo the most recent [`allocate`](Self::allocate).
    pub(crate) fn release_last(&mut self, alloc: &Allocation) {
        if alloc.new_shelf {
            self.shelves.truncate(alloc.shelf);
        } else if let Some(shelf) = self.shelves.get_mut(alloc.shelf) {
            shelf.slots.pop();
        }
    }

    pub(crate) fn allocate(
        &mut self,
        key: GlyphKey,
        width: u32,
        height: u32,
    ) -> Result<Allocation, AllocError> {
        let (size, max_glyphs) = (self.size, self.max_glyphs_per_shelf);
        for (index, shelf) in self.shelves.iter_mut().enumerate() {
            if height > shelf.height {
                continue;
            }
            if let Some(x) = shelf.try_push(key, width, height, size, max_glyphs) {
                return Ok(Allocation {
                    shelf: index,
                    x,
                    y: shelf.baseline,
                    new_shelf: false,
                });
            }
        }

        let baseline = self.stack_height();
        let fits_vertically = baseline
            .checked_add(height)
            .is_some_and(|bottom| bottom <= size);
        if self.shelves.len() >= self.max_shelves || !fits_vertically {
            return Err(AllocError::OutOfRoom);
        }

        let mut shelf = Shelf::new(baseline, height);
        let x = shelf
            .try_push(key, width, height, size, max_glyphs)
            .ok_or(AllocError::TooWide)?;
        self.shelves.push(shelf);
        Ok(Allocation {
            shelf: self.shelves.len() - 1,
            x,
            y: baseline,
            new_shelf: true,
        })
    }
}
