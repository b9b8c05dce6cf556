// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module. Grayscale page transforms used by the scan degradation
// pipeline: skew, sensor noise, contrast loss, resampling and JPEG encoding.

pub mod processor;

pub use processor::ImageProcessor;
