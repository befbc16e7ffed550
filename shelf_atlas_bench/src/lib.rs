// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Shelf Atlas Bench
//!
//! This crate provides benchmarks for the Shelf Atlas library.

use std::rc::Rc;
use std::sync::OnceLock;

use shelf_atlas::texture::cpu::CpuTextures;
use shelf_atlas::{AtlasCache, AtlasConfig, FontContext, Glyph, GlyphKey, GlyphMetrics};

pub mod benches;

/// A set of glyph sizes to be used for benchmarking.
#[derive(Debug)]
pub struct Sample {
    /// The name of the sample.
    pub name: &'static str,
    /// Width and height of each glyph.
    pub sizes: Vec<(u32, u32)>,
}

impl Sample {
    /// Rasterize the sample as glyphs of `font_id`.
    pub fn glyphs(&self, font_id: u64) -> Vec<Rc<Glyph>> {
        self.sizes
            .iter()
            .zip(0_u32..)
            .map(|(&(width, height), glyph_id)| {
                Glyph::new(
                    GlyphKey::new(font_id, glyph_id),
                    width,
                    height,
                    GlyphMetrics::default(),
                    vec![0x80_u8; (width * height) as usize],
                )
            })
            .collect()
    }
}

static SAMPLES: OnceLock<Vec<Sample>> = OnceLock::new();

/// Returns a list of samples to be used for benchmarking.
pub fn get_samples() -> &'static [Sample] {
    SAMPLES.get_or_init(|| {
        vec![
            Sample {
                name: "uniform 12px",
                sizes: vec![(8, 12); 200],
            },
            Sample {
                name: "mixed 10-32px",
                sizes: sizes(500, 10, 32, 0x2545_f491),
            },
            Sample {
                name: "mixed 24-96px",
                sizes: sizes(300, 24, 96, 0x9e37_79b9),
            },
        ]
    })
}

/// A cache large enough for every sample.
pub fn create_cache() -> AtlasCache<CpuTextures> {
    let config = AtlasConfig {
        sheet_size: 1024,
        max_sheets: 4,
        ..Default::default()
    };
    AtlasCache::new(CpuTextures::new(), config).unwrap()
}

/// A cache and font context holding `sample` as font 0 and font 1, with font 0
/// already unloaded so the next compaction has work to do.
pub fn create_fragmented_cache(sample: &Sample) -> (AtlasCache<CpuTextures>, FontContext) {
    let mut cache = create_cache();
    let mut cx = FontContext::new();
    cache.insert_batch(&mut cx, sample.glyphs(0)).unwrap();
    cache.insert_batch(&mut cx, sample.glyphs(1)).unwrap();
    cx.remove_font(0);
    (cache, cx)
}

/// Deterministic glyph sizes with heights between `min` and `max`.
fn sizes(count: usize, min: u32, max: u32, mut seed: u32) -> Vec<(u32, u32)> {
    (0..count)
        .map(|_| {
            // xorshift32
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let height = min + seed % (max - min + 1);
            let width = (height * 3 / 4).max(1) + (seed >> 8) % 4;
            (width, height)
        })
        .collect()
}
