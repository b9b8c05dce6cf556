// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspector: open a generated PDF with `lopdf` and report what a reader
// would see. Page count, `/Info`, whether there is a text layer, the text it
// carries and how the page images are encoded.

use std::path::Path;

use docforge_core::error::{DocforgeError, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument};

use super::metadata::PdfInfo;

/// Read-only view over a PDF.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    // -- Construction ---------------------------------------------------------

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());
        let document = Document::load(path_ref).map_err(|err| {
            DocforgeError::PdfError(format!("failed to open {}: {err}", path_ref.display()))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            DocforgeError::PdfError(format!("failed to load PDF from memory: {err}"))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// The `/Info` dictionary, or defaults when there is none.
    pub fn info(&self) -> Result<PdfInfo> {
        let Ok(info) = self.document.trailer.get(b"Info") else {
            return Ok(PdfInfo::default());
        };
        let dict = self.resolve_dictionary(info)?;
        Ok(PdfInfo::from_dictionary(dict))
    }

    /// True if any page shows text. Invisible text counts: it is what text
    /// extraction and search operate on.
    pub fn has_text_layer(&self) -> Result<bool> {
        for page_id in self.page_ids() {
            let content = self.page_content(page_id)?;
            if content
                .operations
                .iter()
                .any(|op| matches!(op.operator.as_str(), "Tj" | "TJ" | "'" | "\""))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Text shown on all pages in page order, one line per text object.
    ///
    /// Decoding goes through each font's encoding or `/ToUnicode` CMap.
    /// Trailing whitespace and empty lines are dropped.
    pub fn extract_text(&self) -> Result<String> {
        let page_numbers: Vec<u32> = self.document.get_pages().into_keys().collect();
        if page_numbers.is_empty() {
            return Ok(String::new());
        }
        let raw = self
            .document
            .extract_text(&page_numbers)
            .map_err(|err| DocforgeError::PdfError(format!("text extraction failed: {err}")))?;
        let lines: Vec<&str> = raw
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        debug!(pages = page_numbers.len(), lines = lines.len(), "Text extracted");
        Ok(lines.join("\n"))
    }

    /// `/Filter` of every image XObject, page by page.
    pub fn image_filters(&self) -> Result<Vec<String>> {
        let mut filters = Vec::new();
        for page_id in self.page_ids() {
            let page = self
                .document
                .get_dictionary(page_id)
                .map_err(|err| DocforgeError::PdfError(format!("bad page object: {err}")))?;
            let Ok(resources) = page.get(b"Resources") else {
                continue;
            };
            let resources = self.resolve_dictionary(resources)?;
            let Ok(xobjects) = resources.get(b"XObject") else {
                continue;
            };
            for (_, xobject) in self.resolve_dictionary(xobjects)?.iter() {
                let Object::Reference(id) = xobject else {
                    continue;
                };
                let Ok(Object::Stream(stream)) = self.document.get_object(*id) else {
                    continue;
                };
                if let Ok(Object::Name(filter)) = stream.dict.get(b"Filter") {
                    filters.push(String::from_utf8_lossy(filter).into_owned());
                }
            }
        }
        Ok(filters)
    }

    // -- Helpers --------------------------------------------------------------

    fn page_ids(&self) -> Vec<ObjectId> {
        // `get_pages` is keyed by 1-based page number, so values are in order.
        self.document.get_pages().into_values().collect()
    }

    fn page_content(&self, page_id: ObjectId) -> Result<Content> {
        let bytes = self
            .document
            .get_page_content(page_id)
            .map_err(|err| DocforgeError::PdfError(format!("unreadable page content: {err}")))?;
        Content::decode(&bytes)
            .map_err(|err| DocforgeError::PdfError(format!("undecodable page content: {err}")))
    }

    fn resolve_dictionary<'a>(&'a self, object: &'a Object) -> Result<&'a Dictionary> {
        match object {
            Object::Dictionary(dict) => Ok(dict),
            Object::Reference(id) => self
                .document
                .get_dictionary(*id)
                .map_err(|err| DocforgeError::PdfError(format!("dangling reference: {err}"))),
            other => Err(DocforgeError::PdfError(format!(
                "expected a dictionary, found {other:?}"
            ))),
        }
    }
}
