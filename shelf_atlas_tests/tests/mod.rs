// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `shelf_atlas`.
//!
//! - The `util` module contains glyph constructors and the atlas consistency checks
//!   shared by every test.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, so that the helpers only have to be defined once.
//! - Put new tests into the module matching their topic (insertion, compaction, growth,
//!   ownership) and name them with the topic first, e.g. `compaction_evicts_released_glyphs`.
//!   End-to-end walkthroughs go into `scenarios.rs`.

#![allow(missing_docs, reason = "we don't need docs for testing")]
#![allow(clippy::cast_possible_truncation, reason = "not critical for testing")]

mod scenarios;
mod util;
