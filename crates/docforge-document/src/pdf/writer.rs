// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: assemble scan pages into a PDF with `lopdf`.
//
// Every page is one full-bleed JPEG image XObject (DCTDecode, so the encoded
// bytes pass through untouched). A page may carry an invisible text layer
// (render mode 3) positioned over the printed lines, which is what makes a
// scan searchable without changing how it looks. The text layer uses the
// same embedded font as the page raster.

use docforge_core::PaperSize;
use docforge_core::error::{DocforgeError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use tracing::{debug, info, instrument};

use super::font::EmbeddedFont;
use super::metadata::PdfInfo;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// One line of the invisible text layer, in PDF user space (points, origin
/// bottom-left, `y` on the baseline).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x_pt: f32,
    pub y_pt: f32,
    pub size_pt: f32,
    pub text: String,
}

/// An encoded page image plus its optional text layer.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    pub text: Vec<TextRun>,
}

/// Builds image-based PDF documents.
pub struct PdfWriter {
    paper_size: PaperSize,
    info: PdfInfo,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            info: PdfInfo::default(),
        }
    }

    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Set the `/Info` dictionary contents.
    pub fn with_info(mut self, info: PdfInfo) -> Self {
        self.info = info;
        self
    }

    /// Page size in points.
    pub fn page_dimensions_pt(&self) -> (f32, f32) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (w_mm as f32 * POINTS_PER_MM, h_mm as f32 * POINTS_PER_MM)
    }

    // -- Scan pages to PDF ----------------------------------------------------

    /// Write `pages` as a PDF, one image per page scaled to the paper size.
    ///
    /// Object numbering follows page order and nothing time-dependent is
    /// written, so identical pages and metadata give identical bytes.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn write_scan(&self, pages: &[ScanPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(DocforgeError::PdfError("a PDF needs at least one page".into()));
        }
        let (page_w, page_h) = self.page_dimensions_pt();
        info!(paper = ?self.paper_size, title = ?self.info.title, "Creating scan PDF");

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        // Image-only documents carry no font at all.
        let has_text = pages.iter().any(|page| !page.text.is_empty());
        let font_id = has_text.then(|| doc.new_object_id());
        let mut font = EmbeddedFont::new()?;

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let image_id = doc.add_object(image_xobject(page));

            let content = page_content(page, page_w, page_h, &mut font);
            let encoded = content.encode().map_err(|err| {
                DocforgeError::PdfError(format!("failed to encode page {}: {err}", index + 1))
            })?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

            let mut resources = dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            };
            if let Some(font_id) = font_id.filter(|_| !page.text.is_empty()) {
                resources.set("Font", dictionary! { "F1" => font_id });
            }

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
                "Resources" => resources,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
            debug!(
                page = index + 1,
                jpeg_len = page.jpeg.len(),
                text_runs = page.text.len(),
                "Page added"
            );
        }

        if let Some(font_id) = font_id {
            font.write_into(&mut doc, font_id)?;
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let info_id = doc.add_object(self.info.to_dictionary());
        doc.trailer.set("Info", info_id);

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|err| DocforgeError::PdfError(format!("failed to serialise PDF: {err}")))?;
        debug!(output_bytes = output.len(), "Scan PDF serialised");
        Ok(output)
    }
}

/// Grayscale JPEG passed through as a DCTDecode image.
fn image_xobject(page: &ScanPage) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(page.width_px),
        "Height" => i64::from(page.height_px),
        "ColorSpace" => "DeviceGray",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    Stream::new(dict, page.jpeg.clone()).with_compression(false)
}

fn page_content(page: &ScanPage, page_w: f32, page_h: f32, font: &mut EmbeddedFont) -> Content {
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                page_w.into(),
                0.into(),
                0.into(),
                page_h.into(),
                0.into(),
                0.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
        Operation::new("Q", vec![]),
    ];

    for run in &page.text {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tr", vec![3.into()]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), run.size_pt.into()]),
            Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    run.x_pt.into(),
                    run.y_pt.into(),
                ],
            ),
            Operation::new("Tj", vec![font.encode(&run.text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    Content { operations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageProcessor;
    use crate::pdf::inspector::PdfInspector;
    use image::{GrayImage, Luma};

    fn page(text: Vec<TextRun>) -> ScanPage {
        let jpeg = ImageProcessor::from_gray(GrayImage::from_pixel(60, 80, Luma([255])))
            .to_jpeg_bytes(80)
            .unwrap();
        ScanPage {
            jpeg,
            width_px: 60,
            height_px: 80,
            text,
        }
    }

    #[test]
    fn image_only_pages_have_no_text() {
        let pdf = PdfWriter::a4().write_scan(&[page(Vec::new())]).unwrap();
        let inspector = PdfInspector::from_bytes(&pdf).unwrap();
        assert_eq!(inspector.page_count(), 1);
        assert!(!inspector.has_text_layer().unwrap());
        assert_eq!(inspector.image_filters().unwrap(), vec!["DCTDecode".to_string()]);
    }

    #[test]
    fn text_layer_is_extractable() {
        let runs = vec![
            TextRun {
                x_pt: 56.7,
                y_pt: 780.0,
                size_pt: 11.0,
                text: "Invoice (copy) 12/2023".to_string(),
            },
            TextRun {
                x_pt: 56.7,
                y_pt: 765.0,
                size_pt: 11.0,
                text: "Total: 31365.00 PLN".to_string(),
            },
        ];
        let pdf = PdfWriter::a4().write_scan(&[page(runs), page(Vec::new())]).unwrap();
        let inspector = PdfInspector::from_bytes(&pdf).unwrap();
        assert_eq!(inspector.page_count(), 2);
        assert!(inspector.has_text_layer().unwrap());
        assert_eq!(
            inspector.extract_text().unwrap(),
            "Invoice (copy) 12/2023\nTotal: 31365.00 PLN"
        );
    }

    #[test]
    fn polish_text_survives_extraction() {
        let runs = vec![
            TextRun {
                x_pt: 56.7,
                y_pt: 780.0,
                size_pt: 11.0,
                text: "Razem do zapłaty: 31365.00 PLN".to_string(),
            },
            TextRun {
                x_pt: 56.7,
                y_pt: 765.0,
                size_pt: 11.0,
                text: "Zażółć gęślą jaźń, ŁÓDŹ".to_string(),
            },
        ];
        let pdf = PdfWriter::a4().write_scan(&[page(runs)]).unwrap();
        let text = PdfInspector::from_bytes(&pdf).unwrap().extract_text().unwrap();
        assert_eq!(text, "Razem do zapłaty: 31365.00 PLN\nZażółć gęślą jaźń, ŁÓDŹ");
    }

    #[test]
    fn text_layer_embeds_a_composite_font() {
        let runs = vec![TextRun {
            x_pt: 10.0,
            y_pt: 10.0,
            size_pt: 11.0,
            text: "ł".to_string(),
        }];
        let pdf = PdfWriter::a4().write_scan(&[page(runs)]).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let subtypes: Vec<Vec<u8>> = doc
            .objects
            .values()
            .filter_map(|object| object.as_dict().ok())
            .filter(|dict| matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Font"))
            .filter_map(|dict| dict.get(b"Subtype").and_then(Object::as_name).ok())
            .map(<[u8]>::to_vec)
            .collect();
        assert!(subtypes.contains(&b"Type0".to_vec()));
        assert!(subtypes.contains(&b"CIDFontType2".to_vec()));
        assert!(!subtypes.contains(&b"Type1".to_vec()));
    }

    #[test]
    fn image_only_documents_embed_no_font() {
        let pdf = PdfWriter::a4().write_scan(&[page(Vec::new())]).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        assert!(doc.objects.values().all(|object| {
            object
                .as_dict()
                .map(|dict| !matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Font"))
                .unwrap_or(true)
        }));
    }

    #[test]
    fn info_dictionary_round_trips() {
        let info = PdfInfo {
            title: Some("Faktura VAT 12/2023 – kopia".to_string()),
            author: Some("Anna Kowalska".to_string()),
            creation_date: chrono::DateTime::parse_from_rfc3339("2023-06-15T10:00:00+02:00").ok(),
            ..PdfInfo::default()
        };
        let pdf = PdfWriter::a4()
            .with_info(info.clone())
            .write_scan(&[page(Vec::new())])
            .unwrap();
        assert_eq!(PdfInspector::from_bytes(&pdf).unwrap().info().unwrap(), info);
    }

    #[test]
    fn empty_page_list_is_rejected() {
        assert!(PdfWriter::a4().write_scan(&[]).is_err());
    }

    #[test]
    fn a4_page_size_in_points() {
        let (w, h) = PdfWriter::a4().page_dimensions_pt();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);
    }
}
