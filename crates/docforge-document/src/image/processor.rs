// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: rotate, add noise, flatten contrast, resample and encode
// grayscale page images with the `image` and `imageproc` crates.

use std::io::Cursor;

use docforge_core::error::{DocforgeError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::noise::gaussian_noise_mut;
use tracing::{debug, instrument};

/// Paper white, used to fill corners uncovered by rotation.
const PAPER: Luma<u8> = Luma([255]);

/// Processing pipeline over a single grayscale page.
///
/// Each method consumes `self` and returns the transformed processor, so
/// the degradation steps read as a chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_gray(page)
///     .rotate(1.2)
///     .add_gaussian_noise(9.0, seed)
///     .adjust_contrast(0.7)
///     .resample(300, 170)
///     .to_jpeg_bytes(45)?;
/// ```
pub struct ImageProcessor {
    image: GrayImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    /// Decode encoded bytes (JPEG, PNG) and convert to luma.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| DocforgeError::ImageError(format!("failed to decode image: {err}")))?;
        debug!(width = img.width(), height = img.height(), "image decoded");
        Ok(Self {
            image: img.to_luma8(),
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate by `degrees` about the centre, keeping the canvas size. Corners
    /// are filled with paper white.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        if degrees.abs() < f32::EPSILON {
            return self;
        }
        let rotated = rotate_about_center(
            &self.image,
            degrees.to_radians(),
            Interpolation::Bilinear,
            PAPER,
        );
        Self { image: rotated }
    }

    /// Additive zero-mean Gaussian noise. The same seed always yields the
    /// same noise field.
    #[instrument(skip(self), fields(stddev, seed))]
    pub fn add_gaussian_noise(mut self, stddev: f32, seed: u64) -> Self {
        if stddev > 0.0 {
            gaussian_noise_mut(&mut self.image, 0.0, f64::from(stddev), seed);
        }
        self
    }

    /// Scale distances from mid-grey by `factor`. Values below 1.0 wash the
    /// page out; 1.0 is a no-op.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(mut self, factor: f32) -> Self {
        for pixel in self.image.pixels_mut() {
            let value = factor * (f32::from(pixel[0]) - 128.0) + 128.0;
            pixel[0] = value.round().clamp(0.0, 255.0) as u8;
        }
        self
    }

    /// Resample from `from_dpi` to `to_dpi`, keeping the physical page size.
    #[instrument(skip(self), fields(from_dpi, to_dpi))]
    pub fn resample(self, from_dpi: u32, to_dpi: u32) -> Self {
        if from_dpi == to_dpi || from_dpi == 0 {
            return self;
        }
        let scale = f64::from(to_dpi) / f64::from(from_dpi);
        let width = ((f64::from(self.image.width()) * scale).round() as u32).max(1);
        let height = ((f64::from(self.image.height()) * scale).round() as u32).max(1);
        let resized = imageops::resize(&self.image, width, height, FilterType::Triangle);
        debug!(width, height, "page resampled");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as baseline grayscale JPEG at `quality` (1..=100).
    #[instrument(skip(self), fields(quality))]
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        self.image
            .write_with_encoder(encoder)
            .map_err(|err| DocforgeError::ImageError(format!("JPEG encoding failed: {err}")))?;
        let bytes = buffer.into_inner();
        debug!(bytes_len = bytes.len(), "JPEG encoded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> GrayImage {
        // White page with a black bar across the middle.
        GrayImage::from_fn(200, 100, |_, y| {
            if (40..60).contains(&y) { Luma([0]) } else { PAPER }
        })
    }

    #[test]
    fn rotation_keeps_canvas_and_fills_with_white() {
        let rotated = ImageProcessor::from_gray(page()).rotate(2.0).into_gray();
        assert_eq!(rotated.dimensions(), (200, 100));
        assert_eq!(rotated.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn contrast_pulls_towards_mid_grey() {
        let out = ImageProcessor::from_gray(page()).adjust_contrast(0.5).into_gray();
        let white = out.get_pixel(0, 0)[0];
        let black = out.get_pixel(0, 50)[0];
        assert_eq!(white, 192);
        assert_eq!(black, 64);
    }

    #[test]
    fn noise_is_seeded() {
        let a = ImageProcessor::from_gray(page()).add_gaussian_noise(10.0, 7).into_gray();
        let b = ImageProcessor::from_gray(page()).add_gaussian_noise(10.0, 7).into_gray();
        let c = ImageProcessor::from_gray(page()).add_gaussian_noise(10.0, 8).into_gray();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn resample_scales_by_dpi_ratio() {
        let out = ImageProcessor::from_gray(page()).resample(300, 150);
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn jpeg_output_decodes_back() {
        let jpeg = ImageProcessor::from_gray(page()).to_jpeg_bytes(40).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let back = ImageProcessor::from_bytes(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (200, 100));
    }
}
