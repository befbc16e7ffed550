// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # Benchmarks
//!
//! This module provides benchmarks for insertion and compaction.

use crate::{create_cache, create_fragmented_cache, get_samples};
use shelf_atlas::FontContext;
use std::hint::black_box;
use tango_bench::{Benchmark, benchmark_fn};

/// Benchmark for inserting a whole sample into an empty cache.
pub fn insert() -> Vec<Benchmark> {
    get_samples()
        .iter()
        .map(|sample| {
            benchmark_fn(format!("Insert - {}", sample.name), |b| {
                let glyphs = sample.glyphs(0);
                b.iter(move || {
                    let mut cache = create_cache();
                    let mut cx = FontContext::new();
                    let report = cache.insert_batch(&mut cx, glyphs.iter().cloned()).unwrap();
                    black_box(report);
                })
            })
        })
        .collect()
}

/// Benchmark for compacting a cache built with half its glyphs dead.
///
/// The cache is built once per sample. Only the first iteration evicts, so
/// the measurement is dominated by repacking the live set.
pub fn compact() -> Vec<Benchmark> {
    get_samples()
        .iter()
        .map(|sample| {
            benchmark_fn(format!("Compact - {}", sample.name), |b| {
                let (mut cache, cx) = create_fragmented_cache(sample);
                b.iter(move || {
                    let summary = cache.compact(&cx).unwrap();
                    black_box(summary);
                })
            })
        })
        .collect()
}
