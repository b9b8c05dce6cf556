// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer seam: one implementation per output format, looked up by
// document kind.

use std::collections::HashMap;

use docforge_core::config::ScanConfig;
use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{Artifact, Document, DocumentKind};
use tracing::{debug, instrument};

use crate::email::EmailRenderer;
use crate::markdown::MeetingNoteRenderer;
use crate::ooxml::docx::DocxRenderer;
use crate::ooxml::pptx::PptxRenderer;
use crate::ooxml::xlsx::XlsxRenderer;
use crate::scan::synth::ScanRenderer;

/// Serialises a document into the bytes of one file format.
pub trait Renderer: Send + Sync {
    /// Kinds this renderer accepts.
    fn kinds(&self) -> &'static [DocumentKind];

    /// Produce the complete artifact. Nothing is written to disk here, so a
    /// failure never leaves a partial file behind.
    fn render(&self, document: &Document) -> Result<Artifact>;
}

/// Dispatch table from document kind to renderer.
pub struct RendererRegistry {
    renderers: Vec<Box<dyn Renderer>>,
    by_kind: HashMap<DocumentKind, usize>,
}

impl RendererRegistry {
    pub fn empty() -> Self {
        Self {
            renderers: Vec::new(),
            by_kind: HashMap::new(),
        }
    }

    /// Registry with every built-in renderer. The scan renderer is only
    /// registered when `scan` is given, since it loads a font and validates
    /// the degradation profile up front.
    pub fn standard(scan: Option<ScanConfig>) -> Result<Self> {
        let mut registry = Self::empty()
            .with(EmailRenderer)
            .with(MeetingNoteRenderer)
            .with(DocxRenderer)
            .with(XlsxRenderer)
            .with(PptxRenderer);
        if let Some(config) = scan {
            registry = registry.with(ScanRenderer::new(config)?);
        }
        Ok(registry)
    }

    /// Register a renderer. A later registration for the same kind wins.
    pub fn with(mut self, renderer: impl Renderer + 'static) -> Self {
        let index = self.renderers.len();
        for kind in renderer.kinds() {
            self.by_kind.insert(*kind, index);
        }
        self.renderers.push(Box::new(renderer));
        self
    }

    pub fn supports(&self, kind: DocumentKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    #[instrument(skip_all, fields(id = %document.id, kind = %document.kind()))]
    pub fn render(&self, document: &Document) -> Result<Artifact> {
        let kind = document.kind();
        let index = self.by_kind.get(&kind).ok_or_else(|| {
            DocforgeError::render(&document.id, format!("no renderer registered for {kind}"))
        })?;
        let artifact = self.renderers[*index].render(document)?;
        debug!(bytes_len = artifact.bytes.len(), "document rendered");
        Ok(artifact)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

/// Error for a renderer handed a body of the wrong variant.
pub(crate) fn wrong_body(document: &Document, expected: &str) -> DocforgeError {
    DocforgeError::render(
        &document.id,
        format!("expected a {expected} body, got {}", document.kind()),
    )
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::DateTime;
    use docforge_core::types::*;

    pub fn document(id: &str, body: DocumentBody) -> Document {
        Document {
            id: id.to_string(),
            type_name: "test".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2023-06-15T10:00:00+02:00").unwrap(),
            author: "Anna Kowalska".to_string(),
            clients_mentioned: Vec::new(),
            planted_facts: Vec::new(),
            body,
        }
    }

    pub fn email(id: &str) -> Document {
        document(
            id,
            DocumentBody::Email(EmailBody {
                subject: "Budżet Q3".to_string(),
                from: Person {
                    name: "Anna Kowalska".to_string(),
                    email: "anna.kowalska@example.pl".to_string(),
                },
                recipients: vec![Person {
                    name: "Piotr Nowak".to_string(),
                    email: "piotr.nowak@example.pl".to_string(),
                }],
                cc: Vec::new(),
                body: "Cześć Piotr,\nw załączniku budżet.\n".to_string(),
            }),
        )
    }

    pub fn report(id: &str) -> Document {
        document(
            id,
            DocumentBody::Report(ReportBody {
                title: "Raport kwartalny Q3".to_string(),
                sections: vec![
                    Section {
                        heading: "Podsumowanie".to_string(),
                        content: "Przychód wzrósł o 12%.\n\nMarża stabilna.".to_string(),
                        table: None,
                    },
                    Section {
                        heading: "Koszty".to_string(),
                        content: "Hosting i licencje.".to_string(),
                        table: Some(Table {
                            columns: vec!["Pozycja".to_string(), "Kwota".to_string()],
                            rows: vec![vec![
                                CellValue::Text("Hosting".to_string()),
                                CellValue::Number(25500.0),
                            ]],
                        }),
                    },
                ],
                content: None,
                figures: vec![Figure {
                    label: "Przychód".to_string(),
                    value: CellValue::Number(31365.0),
                }],
            }),
        )
    }

    pub fn spreadsheet(id: &str) -> Document {
        document(
            id,
            DocumentBody::Spreadsheet(SpreadsheetBody {
                title: "Budżet 2023".to_string(),
                sheets: vec![Sheet {
                    name: "Q3".to_string(),
                    table: Table {
                        columns: vec![
                            "Pozycja".to_string(),
                            "Netto".to_string(),
                            "VAT".to_string(),
                        ],
                        rows: vec![
                            vec![
                                CellValue::Text("Hosting".to_string()),
                                CellValue::Number(20000.0),
                                CellValue::Number(4600.0),
                            ],
                            vec![
                                CellValue::Text("Licencje".to_string()),
                                CellValue::Number(5500.0),
                                CellValue::Number(1265.0),
                            ],
                        ],
                    },
                }],
            }),
        )
    }

    pub fn presentation(id: &str) -> Document {
        document(
            id,
            DocumentBody::Presentation(PresentationBody {
                title: "Oferta dla Mobilex".to_string(),
                subtitle: Some("Czerwiec 2023".to_string()),
                slides: vec![Slide {
                    layout: SlideLayout::Content,
                    title: "Zakres".to_string(),
                    subtitle: None,
                    bullets: vec!["Aplikacja mobilna".to_string(), "Backend".to_string()],
                    content: None,
                }],
                sections: Vec::new(),
            }),
        )
    }

    pub fn scan(id: &str, difficulty: OcrDifficulty) -> Document {
        document(
            id,
            DocumentBody::PdfScan(ScanBody {
                title: "Faktura VAT 12/2023".to_string(),
                content: "Sprzedawca: Example Sp. z o.o.\nNabywca: Mobilex\nRazem do zapłaty: 31365.00 PLN"
                    .to_string(),
                difficulty,
                requires_ocr: true,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_office_kinds() {
        let registry = RendererRegistry::standard(None).unwrap();
        for kind in [
            DocumentKind::Email,
            DocumentKind::Report,
            DocumentKind::Proposal,
            DocumentKind::MeetingNote,
            DocumentKind::Spreadsheet,
            DocumentKind::Presentation,
        ] {
            assert!(registry.supports(kind), "{kind}");
        }
        assert!(!registry.supports(DocumentKind::PdfScan));
    }

    #[test]
    fn dispatch_by_kind_names_the_artifact() {
        let registry = RendererRegistry::standard(None).unwrap();
        let artifact = registry.render(&fixtures::email("doc_007")).unwrap();
        assert_eq!(artifact.file_name(), "doc_007.eml");
        assert_eq!(artifact.kind, DocumentKind::Email);
    }

    #[test]
    fn missing_renderer_is_a_render_error() {
        let registry = RendererRegistry::empty();
        let err = registry.render(&fixtures::email("doc_007")).unwrap_err();
        assert_eq!(err.class(), docforge_core::ErrorClass::Render);
        assert_eq!(err.document_id(), Some("doc_007"));
    }
}
