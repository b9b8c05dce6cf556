// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module. Writing image-based scan PDFs and inspecting them again, both
// through `lopdf`.

pub mod font;
pub mod inspector;
pub mod metadata;
pub mod writer;

pub use inspector::PdfInspector;
pub use metadata::PdfInfo;
pub use writer::{PdfWriter, ScanPage, TextRun};
