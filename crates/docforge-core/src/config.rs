// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Generation configuration. Built once by the CLI (defaults, optional JSON
// file, then flags) and passed by value into the pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocforgeError, Result};
use crate::types::PaperSize;

// Legibility bounds for the hard scan profile. Anything outside these is
// rejected before a single page is rendered.
pub const MIN_ROTATION_DEGREES: f32 = 0.5;
pub const MAX_ROTATION_DEGREES: f32 = 2.5;
pub const MAX_NOISE_STDDEV: f32 = 30.0;
pub const MIN_CONTRAST_FACTOR: f32 = 0.4;
pub const MAX_CONTRAST_FACTOR: f32 = 1.0;
pub const MIN_TARGET_DPI: u32 = 150;
pub const MAX_TARGET_DPI: u32 = 200;
pub const MIN_JPEG_QUALITY: u8 = 20;
pub const MAX_JPEG_QUALITY: u8 = 95;
pub const MIN_RENDER_DPI: u32 = 150;

/// Inclusive parameter range sampled once per document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> ParamRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// True when `min <= max` and both ends lie inside `[lower, upper]`.
    pub fn within(&self, lower: T, upper: T) -> bool {
        self.min <= self.max && self.min >= lower && self.max <= upper
    }

    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Scan synthesis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Paper the page images are laid out on.
    pub paper_size: PaperSize,
    /// Resolution of the clean page render.
    pub render_dpi: u32,
    /// Base seed; each document derives its own seed from this and its id.
    pub seed: u64,
    pub rotation_degrees: ParamRange<f32>,
    pub noise_stddev: ParamRange<f32>,
    pub contrast_factor: ParamRange<f32>,
    pub target_dpi: ParamRange<u32>,
    pub jpeg_quality: ParamRange<u8>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            render_dpi: 300,
            seed: 42,
            rotation_degrees: ParamRange::new(MIN_ROTATION_DEGREES, MAX_ROTATION_DEGREES),
            noise_stddev: ParamRange::new(6.0, 14.0),
            contrast_factor: ParamRange::new(0.6, 0.8),
            target_dpi: ParamRange::new(MIN_TARGET_DPI, MAX_TARGET_DPI),
            jpeg_quality: ParamRange::new(35, 55),
        }
    }
}

impl ScanConfig {
    /// Reject any configuration that could produce an unreadable page.
    pub fn validate(&self) -> Result<()> {
        if !self
            .rotation_degrees
            .within(MIN_ROTATION_DEGREES, MAX_ROTATION_DEGREES)
        {
            return Err(DocforgeError::InvalidDegradation(format!(
                "rotation range {:?} must lie within [{MIN_ROTATION_DEGREES}, {MAX_ROTATION_DEGREES}] degrees",
                self.rotation_degrees
            )));
        }
        if !self.noise_stddev.within(0.0, MAX_NOISE_STDDEV) {
            return Err(DocforgeError::InvalidDegradation(format!(
                "noise stddev range {:?} must lie within [0, {MAX_NOISE_STDDEV}]",
                self.noise_stddev
            )));
        }
        if !self
            .contrast_factor
            .within(MIN_CONTRAST_FACTOR, MAX_CONTRAST_FACTOR)
        {
            return Err(DocforgeError::InvalidDegradation(format!(
                "contrast factor range {:?} must lie within [{MIN_CONTRAST_FACTOR}, {MAX_CONTRAST_FACTOR}]",
                self.contrast_factor
            )));
        }
        if !self.target_dpi.within(MIN_TARGET_DPI, MAX_TARGET_DPI) {
            return Err(DocforgeError::InvalidDegradation(format!(
                "target DPI range {:?} must lie within [{MIN_TARGET_DPI}, {MAX_TARGET_DPI}]",
                self.target_dpi
            )));
        }
        if !self.jpeg_quality.within(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY) {
            return Err(DocforgeError::InvalidDegradation(format!(
                "JPEG quality range {:?} must lie within [{MIN_JPEG_QUALITY}, {MAX_JPEG_QUALITY}]",
                self.jpeg_quality
            )));
        }
        if self.render_dpi < MIN_RENDER_DPI {
            return Err(DocforgeError::InvalidDegradation(format!(
                "render DPI {} is below the minimum of {MIN_RENDER_DPI}",
                self.render_dpi
            )));
        }
        if self.render_dpi < self.target_dpi.max {
            return Err(DocforgeError::InvalidDegradation(format!(
                "render DPI {} is below the target DPI {}; degradation only downsamples",
                self.render_dpi, self.target_dpi.max
            )));
        }
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        if w_mm < 50 || h_mm < 50 {
            return Err(DocforgeError::InvalidDegradation(format!(
                "paper {w_mm}x{h_mm} mm is too small to hold legible text"
            )));
        }
        Ok(())
    }
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Corpus JSON with a top-level `documents` array.
    pub input: PathBuf,
    /// Destination directory for artifacts.
    pub output_dir: PathBuf,
    /// Synthesize `pdf_scan` documents (off by default: slowest step).
    pub include_pdf: bool,
    /// Export the relational database alongside the documents.
    pub include_db: bool,
    /// Database definition consumed when `include_db` is set.
    pub database_input: PathBuf,
    /// Write `manifest.json` with a SHA-256 per artifact.
    pub write_manifest: bool,
    /// Stop at the first failing document instead of collecting failures.
    pub fail_fast: bool,
    pub scan: ScanConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("dataset/documents.json"),
            output_dir: PathBuf::from("output"),
            include_pdf: false,
            include_db: false,
            database_input: PathBuf::from("dataset/database.json"),
            write_manifest: false,
            fail_fast: false,
            scan: ScanConfig::default(),
        }
    }
}

impl GenerateConfig {
    /// Load a configuration file; missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        Ok(config)
    }
}
