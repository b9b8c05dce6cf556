// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasteriser: a title and body text laid out in a monospaced font on
// white grayscale pages, flowing onto as many pages as the text needs.

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use docforge_core::PaperSize;
use docforge_core::error::Result;
use image::{GrayImage, Luma};
use imageproc::drawing::draw_text_mut;
use tracing::debug;

use crate::font::bundled_font;
use crate::text::wrap_text;

pub const TITLE_PT: f32 = 16.0;
pub const BODY_PT: f32 = 11.0;
pub const MARGIN_MM: f32 = 20.0;
const LINE_SPACING: f32 = 1.35;

const INK: Luma<u8> = Luma([0]);
const PAPER: Luma<u8> = Luma([255]);

/// A line of text as printed on a page, in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x_px: f32,
    /// Distance of the baseline from the top edge.
    pub baseline_px: f32,
    pub size_pt: f32,
    pub text: String,
}

/// One rendered page and the lines printed on it.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub image: GrayImage,
    pub lines: Vec<PlacedLine>,
}

/// Pixel metrics for one font size.
#[derive(Debug, Clone, Copy)]
struct Metrics {
    size_pt: f32,
    scale: PxScale,
    advance: f32,
    ascent: f32,
    line_height: f32,
}

pub struct PageRaster {
    font: FontRef<'static>,
    paper: PaperSize,
    dpi: u32,
}

impl PageRaster {
    pub fn new(paper: PaperSize, dpi: u32) -> Result<Self> {
        let font = bundled_font()?;
        Ok(Self { font, paper, dpi })
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn paper(&self) -> PaperSize {
        self.paper
    }

    /// Pixels per point at the raster resolution.
    pub fn px_per_pt(&self) -> f32 {
        self.dpi as f32 / 72.0
    }

    fn metrics(&self, size_pt: f32) -> Metrics {
        // PxScale is the ascent-to-descent height, not the em size.
        let em_px = size_pt * self.px_per_pt();
        let units_per_em = self.font.units_per_em().unwrap_or(2048.0);
        let scale = PxScale::from(em_px * self.font.height_unscaled() / units_per_em);
        let scaled = self.font.as_scaled(scale);
        Metrics {
            size_pt,
            scale,
            advance: scaled.h_advance(self.font.glyph_id('M')),
            ascent: scaled.ascent(),
            line_height: em_px * LINE_SPACING,
        }
    }

    /// Lay out `title` and `body` on as many pages as needed.
    pub fn render(&self, title: &str, body: &str) -> Vec<RasterPage> {
        let (width, height) = self.paper.dimensions_px(self.dpi);
        let margin = MARGIN_MM * self.dpi as f32 / 25.4;
        let usable_width = width as f32 - 2.0 * margin;
        let bottom = height as f32 - margin;

        let title_metrics = self.metrics(TITLE_PT);
        let body_metrics = self.metrics(BODY_PT);
        let chars = |m: &Metrics| ((usable_width / m.advance).floor() as usize).max(1);

        let mut lines: Vec<(Metrics, String)> = wrap_text(title, chars(&title_metrics))
            .into_iter()
            .map(|line| (title_metrics, line))
            .collect();
        lines.push((body_metrics, String::new()));
        lines.extend(
            wrap_text(body, chars(&body_metrics))
                .into_iter()
                .map(|line| (body_metrics, line)),
        );

        let blank = || GrayImage::from_pixel(width, height, PAPER);
        let mut pages = Vec::new();
        let mut current = RasterPage {
            image: blank(),
            lines: Vec::new(),
        };
        let mut y = margin;

        for (metrics, text) in lines {
            if y + metrics.line_height > bottom && y > margin {
                let full = std::mem::replace(
                    &mut current,
                    RasterPage {
                        image: blank(),
                        lines: Vec::new(),
                    },
                );
                pages.push(full);
                y = margin;
            }
            if !text.trim().is_empty() {
                draw_text_mut(
                    &mut current.image,
                    INK,
                    margin.round() as i32,
                    y.round() as i32,
                    metrics.scale,
                    &self.font,
                    &text,
                );
                current.lines.push(PlacedLine {
                    x_px: margin,
                    baseline_px: y + metrics.ascent,
                    size_pt: metrics.size_pt,
                    text,
                });
            }
            y += metrics.line_height;
        }
        pages.push(current);

        debug!(
            pages = pages.len(),
            dpi = self.dpi,
            width,
            height,
            "text rasterised"
        );
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_fits_one_page() {
        let raster = PageRaster::new(PaperSize::A5, 150).unwrap();
        let pages = raster.render("Faktura", "Nabywca: Mobilex\n\nRazem: 31365.00 PLN");
        assert_eq!(pages.len(), 1);

        let page = &pages[0];
        assert_eq!(page.image.dimensions(), PaperSize::A5.dimensions_px(150));
        let texts: Vec<&str> = page.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Faktura", "Nabywca: Mobilex", "Razem: 31365.00 PLN"]);
        assert_eq!(page.lines[0].size_pt, TITLE_PT);
        assert!(page.lines[1].baseline_px < page.lines[2].baseline_px);

        // Something was actually drawn.
        assert!(page.image.pixels().any(|p| p[0] < 128));
    }

    #[test]
    fn long_text_flows_onto_more_pages() {
        let raster = PageRaster::new(PaperSize::A5, 150).unwrap();
        let body: Vec<String> = (1..=120).map(|i| format!("Pozycja {i}")).collect();
        let pages = raster.render("Zestawienie", &body.join("\n"));

        assert!(pages.len() > 1);
        let placed: usize = pages.iter().map(|p| p.lines.len()).sum();
        assert_eq!(placed, 121);

        let (_, height) = PaperSize::A5.dimensions_px(150);
        for page in &pages {
            for line in &page.lines {
                assert!(line.baseline_px < height as f32);
            }
        }
        assert_eq!(pages.last().unwrap().lines.last().unwrap().text, "Pozycja 120");
    }

    #[test]
    fn long_lines_wrap_within_the_margins() {
        let raster = PageRaster::new(PaperSize::A5, 150).unwrap();
        let pages = raster.render("T", &"słowo ".repeat(100));
        assert!(pages[0].lines.len() > 3);
    }
}
