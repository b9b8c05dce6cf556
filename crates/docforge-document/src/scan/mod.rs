// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan synthesis: lay text out on page images, degrade them like a cheap
// office scanner would, and wrap the result in a PDF.

pub mod raster;
pub mod synth;

pub use raster::{PageRaster, PlacedLine, RasterPage};
pub use synth::{DegradationPlan, ScanRenderer, ScanSynthesizer};
