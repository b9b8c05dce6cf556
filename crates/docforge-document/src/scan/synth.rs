// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan synthesizer. Renders a document onto page images and turns them into
// a PDF in one of two profiles:
//
// - easy: clean page at full resolution, no rotation or noise, with an
//   invisible text layer so the content is extractable;
// - hard: rotation, Gaussian noise, contrast loss, downsampling and JPEG
//   recompression, in that order, with no text layer at all.
//
// Every random choice comes from a per-document plan seeded from the
// configured seed and the document id, so output is reproducible.

use docforge_core::config::{
    MAX_CONTRAST_FACTOR, MAX_JPEG_QUALITY, MAX_NOISE_STDDEV, MAX_ROTATION_DEGREES,
    MAX_TARGET_DPI, MIN_CONTRAST_FACTOR, MIN_JPEG_QUALITY, MIN_ROTATION_DEGREES, MIN_TARGET_DPI,
    ParamRange, ScanConfig,
};
use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{Artifact, Document, DocumentBody, DocumentKind, OcrDifficulty};
use rand::distributions::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use super::raster::{PageRaster, RasterPage};
use crate::image::ImageProcessor;
use crate::pdf::metadata::PdfInfo;
use crate::pdf::writer::{PdfWriter, ScanPage, TextRun};
use crate::render::{Renderer, wrong_body};

/// JPEG quality for clean pages.
const EASY_JPEG_QUALITY: u8 = 90;

/// Degradation parameters for one document. All values are already inside
/// the legibility bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegradationPlan {
    pub seed: u64,
    /// Signed; the magnitude is always within `[0.5, 2.5]`.
    pub rotation_degrees: f32,
    pub noise_stddev: f32,
    pub contrast_factor: f32,
    pub target_dpi: u32,
    pub jpeg_quality: u8,
}

impl DegradationPlan {
    /// Sample a plan for `document_id`. The seed is the first eight bytes of
    /// `sha256("{config.seed}:{document_id}")`.
    pub fn sample(config: &ScanConfig, document_id: &str) -> Self {
        let digest = Sha256::digest(format!("{}:{document_id}", config.seed).as_bytes());
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        let seed = u64::from_be_bytes(seed_bytes);

        let mut rng = StdRng::seed_from_u64(seed);
        let magnitude = sample(&mut rng, config.rotation_degrees);
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let noise_stddev = sample(&mut rng, config.noise_stddev);
        let contrast_factor = sample(&mut rng, config.contrast_factor);
        let target_dpi = sample(&mut rng, config.target_dpi);
        let jpeg_quality = sample(&mut rng, config.jpeg_quality);

        Self {
            seed,
            rotation_degrees: sign * magnitude,
            noise_stddev,
            contrast_factor,
            target_dpi,
            jpeg_quality,
        }
        .clamped()
    }

    /// Force every parameter into the legibility bounds.
    fn clamped(self) -> Self {
        let magnitude = self
            .rotation_degrees
            .abs()
            .clamp(MIN_ROTATION_DEGREES, MAX_ROTATION_DEGREES);
        Self {
            rotation_degrees: magnitude.copysign(self.rotation_degrees),
            noise_stddev: self.noise_stddev.clamp(0.0, MAX_NOISE_STDDEV),
            contrast_factor: self
                .contrast_factor
                .clamp(MIN_CONTRAST_FACTOR, MAX_CONTRAST_FACTOR),
            target_dpi: self.target_dpi.clamp(MIN_TARGET_DPI, MAX_TARGET_DPI),
            jpeg_quality: self.jpeg_quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY),
            ..self
        }
    }
}

fn sample<T>(rng: &mut StdRng, range: ParamRange<T>) -> T
where
    T: PartialOrd + Copy + SampleUniform,
{
    if range.min < range.max {
        rng.gen_range(range.min..=range.max)
    } else {
        range.min
    }
}

/// Turns scan documents into PDFs.
pub struct ScanSynthesizer {
    config: ScanConfig,
    raster: PageRaster,
}

impl ScanSynthesizer {
    /// Validate `config` against the legibility bounds and load the font.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let raster = PageRaster::new(config.paper_size, config.render_dpi)?;
        Ok(Self { config, raster })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn plan(&self, document_id: &str) -> DegradationPlan {
        DegradationPlan::sample(&self.config, document_id)
    }

    /// Render `document` as a scan PDF in `profile`.
    #[instrument(skip_all, fields(id = %document.id, ?profile))]
    pub fn synthesize(&self, document: &Document, profile: OcrDifficulty) -> Result<Vec<u8>> {
        let DocumentBody::PdfScan(scan) = &document.body else {
            return Err(DocforgeError::generation(
                &document.id,
                format!("{} documents cannot be scanned", document.kind()),
            ));
        };
        if scan.content.trim().is_empty() {
            return Err(DocforgeError::generation(
                &document.id,
                "scan has no renderable text content",
            ));
        }

        let rendered = self.raster.render(&scan.title, &scan.content);
        let writer =
            PdfWriter::new(self.config.paper_size).with_info(PdfInfo::for_document(document));
        let pages = match profile {
            OcrDifficulty::Easy => self.easy_pages(rendered, writer.page_dimensions_pt().1)?,
            OcrDifficulty::Hard => {
                let plan = self.plan(&document.id);
                info!(
                    rotation = plan.rotation_degrees,
                    noise = plan.noise_stddev,
                    contrast = plan.contrast_factor,
                    target_dpi = plan.target_dpi,
                    quality = plan.jpeg_quality,
                    "Degrading scan"
                );
                self.hard_pages(rendered, &plan)?
            }
        };

        let pdf = writer.write_scan(&pages)?;
        debug!(pages = pages.len(), bytes_len = pdf.len(), "scan synthesized");
        Ok(pdf)
    }

    /// Clean pages plus an invisible text layer over each printed line.
    fn easy_pages(&self, rendered: Vec<RasterPage>, page_height_pt: f32) -> Result<Vec<ScanPage>> {
        let pt_per_px = 1.0 / self.raster.px_per_pt();
        rendered
            .into_iter()
            .map(|page| {
                let text = page
                    .lines
                    .iter()
                    .map(|line| TextRun {
                        x_pt: line.x_px * pt_per_px,
                        y_pt: page_height_pt - line.baseline_px * pt_per_px,
                        size_pt: line.size_pt,
                        text: line.text.clone(),
                    })
                    .collect();
                let processor = ImageProcessor::from_gray(page.image);
                Ok(ScanPage {
                    width_px: processor.width(),
                    height_px: processor.height(),
                    jpeg: processor.to_jpeg_bytes(EASY_JPEG_QUALITY)?,
                    text,
                })
            })
            .collect()
    }

    /// Rotate, add noise, reduce contrast, downsample, recompress. Each page
    /// gets its own noise seed.
    fn hard_pages(&self, rendered: Vec<RasterPage>, plan: &DegradationPlan) -> Result<Vec<ScanPage>> {
        rendered
            .into_iter()
            .enumerate()
            .map(|(index, page)| {
                let processor = ImageProcessor::from_gray(page.image)
                    .rotate(plan.rotation_degrees)
                    .add_gaussian_noise(plan.noise_stddev, plan.seed.wrapping_add(index as u64))
                    .adjust_contrast(plan.contrast_factor)
                    .resample(self.config.render_dpi, plan.target_dpi);
                Ok(ScanPage {
                    width_px: processor.width(),
                    height_px: processor.height(),
                    jpeg: processor.to_jpeg_bytes(plan.jpeg_quality)?,
                    text: Vec::new(),
                })
            })
            .collect()
    }
}

/// [`Renderer`] adapter: scans each `pdf_scan` document in its own profile.
pub struct ScanRenderer {
    synthesizer: ScanSynthesizer,
}

impl ScanRenderer {
    pub fn new(config: ScanConfig) -> Result<Self> {
        Ok(Self {
            synthesizer: ScanSynthesizer::new(config)?,
        })
    }
}

impl Renderer for ScanRenderer {
    fn kinds(&self) -> &'static [DocumentKind] {
        &[DocumentKind::PdfScan]
    }

    fn render(&self, document: &Document) -> Result<Artifact> {
        let DocumentBody::PdfScan(scan) = &document.body else {
            return Err(wrong_body(document, "pdf_scan"));
        };
        let bytes = self.synthesizer.synthesize(document, scan.difficulty)?;
        Ok(Artifact::new(&document.id, DocumentKind::PdfScan, bytes))
    }
}
