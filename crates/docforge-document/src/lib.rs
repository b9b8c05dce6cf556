// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docforge-document: turns typed documents into format-correct bytes.
//
// Provides one renderer per document type (EML, Markdown, DOCX, XLSX, PPTX),
// the OOXML packaging they share, a lopdf-based PDF writer and inspector, and
// the scan synthesizer that rasterises and degrades pages for OCR test data.

pub mod email;
pub mod font;
pub mod image;
pub mod markdown;
pub mod ooxml;
pub mod pdf;
pub mod render;
pub mod scan;
pub mod text;

// Re-export the primary structs so callers can use `docforge_document::RendererRegistry` etc.
pub use email::EmailRenderer;
pub use crate::image::processor::ImageProcessor;
pub use markdown::MeetingNoteRenderer;
pub use ooxml::docx::DocxRenderer;
pub use ooxml::pptx::PptxRenderer;
pub use ooxml::xlsx::XlsxRenderer;
pub use pdf::inspector::PdfInspector;
pub use pdf::writer::{PdfWriter, ScanPage, TextRun};
pub use render::{Renderer, RendererRegistry};
pub use scan::synth::{DegradationPlan, ScanRenderer, ScanSynthesizer};
