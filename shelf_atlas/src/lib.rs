// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf Atlas packs glyph bitmaps into fixed-size square texture pages ("sheets")
//! so that a text renderer can sample glyphs without re-rasterizing them every frame.
//!
//! The central type is [`AtlasCache`]. It:
//! - Shelf-packs glyph bitmaps into sheets, tallest first
//! - Uploads each placed bitmap through a [`TextureBackend`]
//! - Tracks residency with a global index keyed by [`GlyphKey`]
//! - Reclaims space by compaction: everything that is no longer referenced by a
//!   [`LivenessProvider`] is evicted and the rest is repacked from scratch
//! - Grows by whole sheets, up to a configured ceiling
//!
//! Glyphs are shared between the cache index and the per-font liveness index
//! (see [`FontContext`]) through [`Rc`](alloc::rc::Rc). A glyph's bitmap is kept
//! for its whole lifetime so it can be re-uploaded during compaction.
//!
//! ## Features
//!
//! - `std` (enabled by default): Forwards `std` support to the `log` facade.
//! - `png`: Enables [`CpuTexture::save_png`](texture::cpu::CpuTexture::save_png)
//!   for dumping sheets while debugging.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod cache;
mod config;
mod error;
mod glyph;
mod liveness;
mod report;
mod shelf;

pub mod texture;

pub use cache::{AtlasCache, AtlasStats, CompactionSummary};
pub use config::{AtlasConfig, PixelFormat};
pub use error::{Error, ErrorKind};
pub use glyph::{Glyph, GlyphKey, GlyphMetrics, Placement};
pub use liveness::{FontContext, FontGlyphs, LivenessProvider};
pub use report::{InsertOutcome, InsertReport, InsertResult};
pub use shelf::{Shelf, ShelfSlot};
pub use texture::{TextureBackend, TextureError, TextureId};
