// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the typed document model produced by the corpus loader
// and consumed by the renderers.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Document types the generator knows how to materialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Email,
    Report,
    Proposal,
    MeetingNote,
    Spreadsheet,
    Presentation,
    PdfScan,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 7] = [
        Self::Email,
        Self::Report,
        Self::Proposal,
        Self::MeetingNote,
        Self::Spreadsheet,
        Self::Presentation,
        Self::PdfScan,
    ];

    /// File extension of the artifact produced for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Email => "eml",
            Self::Report | Self::Proposal => "docx",
            Self::MeetingNote => "md",
            Self::Spreadsheet => "xlsx",
            Self::Presentation => "pptx",
            Self::PdfScan => "pdf",
        }
    }

    /// MIME type of the produced artifact.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Email => "message/rfc822",
            Self::Report | Self::Proposal => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::MeetingNote => "text/markdown",
            Self::Spreadsheet => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Presentation => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::PdfScan => "application/pdf",
        }
    }

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Report => "report",
            Self::Proposal => "proposal",
            Self::MeetingNote => "meeting_note",
            Self::Spreadsheet => "spreadsheet",
            Self::Presentation => "presentation",
            Self::PdfScan => "pdf_scan",
        }
    }

    /// Infer the kind from an explicit output format (`eml`, `docx`, ...).
    ///
    /// `docx` is ambiguous between reports and proposals, so the caller
    /// passes the type name to break the tie.
    pub fn from_format(format: &str, type_name: &str) -> Option<Self> {
        match format.to_ascii_lowercase().as_str() {
            "eml" => Some(Self::Email),
            "md" | "markdown" => Some(Self::MeetingNote),
            "docx" => {
                if type_name.eq_ignore_ascii_case("proposal") {
                    Some(Self::Proposal)
                } else {
                    Some(Self::Report)
                }
            }
            "xlsx" => Some(Self::Spreadsheet),
            "pptx" => Some(Self::Presentation),
            "pdf" => Some(Self::PdfScan),
            _ => None,
        }
    }

    /// Classify a dataset record from its `type` and optional `format`.
    ///
    /// The explicit format wins. Otherwise the canonical names are accepted
    /// as well as the dataset's fine-grained ones (`email_internal`,
    /// `report_quarterly`, `meeting_notes`, `project_kickoff`, ...).
    pub fn classify(type_name: &str, format: Option<&str>) -> Option<Self> {
        if let Some(kind) = format.and_then(|f| Self::from_format(f, type_name)) {
            return Some(kind);
        }

        let name = type_name.to_ascii_lowercase();
        if name == "pdf_scan" || name.contains("scan") || name.starts_with("pdf") {
            Some(Self::PdfScan)
        } else if name.contains("email") {
            Some(Self::Email)
        } else if name.starts_with("meeting_note") || name == "project_kickoff" {
            Some(Self::MeetingNote)
        } else if name.contains("spreadsheet") {
            Some(Self::Spreadsheet)
        } else if name.contains("presentation") {
            Some(Self::Presentation)
        } else if name == "proposal" || name.starts_with("proposal_") {
            Some(Self::Proposal)
        } else if name == "report" || name.starts_with("report_") {
            Some(Self::Report)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named mailbox (`Name <address>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
}

impl Person {
    /// RFC 5322 mailbox form.
    pub fn mailbox(&self) -> String {
        if self.name.trim().is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }
}

/// A single spreadsheet or table cell. Numbers stay numbers end to end.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Human-readable rendering used by word-processing tables.
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.clone(),
            Self::Bool(b) => b.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// Column headers plus rows of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

/// One heading-delimited section of a report or presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub content: String,
    pub table: Option<Table>,
}

/// A labelled key figure (`"Revenue Q3" → 31365.0`).
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub label: String,
    pub value: CellValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailBody {
    pub subject: String,
    pub from: Person,
    pub recipients: Vec<Person>,
    pub cc: Vec<Person>,
    pub body: String,
}

/// Shared by reports and proposals.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBody {
    pub title: String,
    pub sections: Vec<Section>,
    /// Free text used when no explicit sections were authored.
    pub content: Option<String>,
    pub figures: Vec<Figure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetBody {
    pub title: String,
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideLayout {
    Title,
    Content,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub layout: SlideLayout,
    pub title: String,
    pub subtitle: Option<String>,
    pub bullets: Vec<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentationBody {
    pub title: String,
    pub subtitle: Option<String>,
    pub slides: Vec<Slide>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionItem {
    pub task: String,
    pub owner: Option<String>,
    pub due: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetingNoteBody {
    pub title: String,
    pub attendees: Vec<String>,
    pub location: Option<String>,
    pub content: String,
    pub discussion_points: Vec<String>,
    pub action_items: Vec<ActionItem>,
}

/// OCR difficulty tier of a synthesized scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrDifficulty {
    Easy,
    Hard,
}

impl OcrDifficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanBody {
    pub title: String,
    pub content: String,
    pub difficulty: OcrDifficulty,
    pub requires_ocr: bool,
}

/// Type-specific payload. Each variant carries exactly what its renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    Email(EmailBody),
    Report(ReportBody),
    Proposal(ReportBody),
    MeetingNote(MeetingNoteBody),
    Spreadsheet(SpreadsheetBody),
    Presentation(PresentationBody),
    PdfScan(ScanBody),
}

/// One dataset entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Fine-grained type label from the dataset (`report_quarterly`, ...).
    pub type_name: String,
    pub timestamp: DateTime<FixedOffset>,
    pub author: String,
    pub clients_mentioned: Vec<String>,
    pub planted_facts: Vec<String>,
    pub body: DocumentBody,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match &self.body {
            DocumentBody::Email(_) => DocumentKind::Email,
            DocumentBody::Report(_) => DocumentKind::Report,
            DocumentBody::Proposal(_) => DocumentKind::Proposal,
            DocumentBody::MeetingNote(_) => DocumentKind::MeetingNote,
            DocumentBody::Spreadsheet(_) => DocumentKind::Spreadsheet,
            DocumentBody::Presentation(_) => DocumentKind::Presentation,
            DocumentBody::PdfScan(_) => DocumentKind::PdfScan,
        }
    }

    /// Title, or subject for emails.
    pub fn title(&self) -> &str {
        match &self.body {
            DocumentBody::Email(email) => &email.subject,
            DocumentBody::Report(report) | DocumentBody::Proposal(report) => &report.title,
            DocumentBody::MeetingNote(note) => &note.title,
            DocumentBody::Spreadsheet(sheet) => &sheet.title,
            DocumentBody::Presentation(deck) => &deck.title,
            DocumentBody::PdfScan(scan) => &scan.title,
        }
    }

    /// Deterministic artifact file name: identifier plus extension.
    pub fn file_name(&self) -> String {
        artifact_file_name(&self.id, self.kind())
    }
}

pub fn artifact_file_name(id: &str, kind: DocumentKind) -> String {
    format!("{}.{}", id, kind.extension())
}

/// Rendered bytes for one document, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub document_id: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(document_id: impl Into<String>, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        Self {
            document_id: document_id.into(),
            kind,
            bytes,
        }
    }

    pub fn file_name(&self) -> String {
        artifact_file_name(&self.document_id, self.kind)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Pixel dimensions at the given resolution.
    pub fn dimensions_px(&self, dpi: u32) -> (u32, u32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        let to_px = |mm: u32| (mm as f32 * dpi as f32 / 25.4).round() as u32;
        (to_px(w_mm), to_px(h_mm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefers_explicit_format() {
        assert_eq!(
            DocumentKind::classify("report_quarterly", Some("pptx")),
            Some(DocumentKind::Presentation)
        );
        assert_eq!(
            DocumentKind::classify("proposal", Some("docx")),
            Some(DocumentKind::Proposal)
        );
    }

    #[test]
    fn classify_dataset_type_names() {
        let cases = [
            ("email", DocumentKind::Email),
            ("email_internal", DocumentKind::Email),
            ("email_client", DocumentKind::Email),
            ("report", DocumentKind::Report),
            ("report_monthly", DocumentKind::Report),
            ("proposal", DocumentKind::Proposal),
            ("meeting_note", DocumentKind::MeetingNote),
            ("meeting_notes", DocumentKind::MeetingNote),
            ("project_kickoff", DocumentKind::MeetingNote),
            ("spreadsheet_budget", DocumentKind::Spreadsheet),
            ("presentation_client", DocumentKind::Presentation),
            ("pdf_scan", DocumentKind::PdfScan),
            ("invoice_scan", DocumentKind::PdfScan),
        ];
        for (name, expected) in cases {
            assert_eq!(DocumentKind::classify(name, None), Some(expected), "{name}");
        }
        assert_eq!(DocumentKind::classify("hologram", None), None);
    }

    #[test]
    fn every_kind_has_an_extension() {
        for kind in DocumentKind::ALL {
            assert!(!kind.extension().is_empty());
            assert!(!kind.mime_type().is_empty());
        }
        assert_eq!(artifact_file_name("doc_007", DocumentKind::Email), "doc_007.eml");
        assert_eq!(artifact_file_name("doc_010", DocumentKind::Proposal), "doc_010.docx");
    }

    #[test]
    fn paper_pixels_scale_with_dpi() {
        assert_eq!(PaperSize::A4.dimensions_px(300), (2480, 3508));
        let (w150, _) = PaperSize::A4.dimensions_px(150);
        assert_eq!(w150, 1240);
    }

    #[test]
    fn mailbox_formatting() {
        let person = Person {
            name: "Anna Kowalska".into(),
            email: "anna@example.pl".into(),
        };
        assert_eq!(person.mailbox(), "Anna Kowalska <anna@example.pl>");
        let bare = Person {
            name: " ".into(),
            email: "biuro@example.pl".into(),
        };
        assert_eq!(bare.mailbox(), "biuro@example.pl");
    }
}
