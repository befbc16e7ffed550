// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shelf Atlas benchmarks.

use tango_bench::{tango_benchmarks, tango_main};

use shelf_atlas_bench::benches::{compact, insert};

tango_benchmarks!(insert(), compact());
tango_main!();
