// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corpus loader: reads the JSON dataset into typed `Document` records.
//
// Only a malformed file (bad JSON, no `documents` array) is fatal. A single
// bad record is rejected with a ParseError bound to its identifier and the
// rest of the corpus still loads.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{DocforgeError, DocumentFailure, Result};
use crate::types::{
    ActionItem, CellValue, Document, DocumentBody, DocumentKind, EmailBody, Figure,
    MeetingNoteBody, OcrDifficulty, Person, PresentationBody, ReportBody, ScanBody, Section,
    Sheet, Slide, SlideLayout, SpreadsheetBody, Table,
};

/// Inclusive window all document timestamps must fall into, compared on
/// local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn contains(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        let local = timestamp.naive_local();
        self.start <= local && local <= self.end
    }

    fn from_meta(meta: &Value) -> Result<Option<Self>> {
        let Some(range) = meta.get("time_range").or_else(|| meta.get("date_range")) else {
            return Ok(None);
        };
        let bound = |key: &str, end_of_day: bool| -> Result<NaiveDateTime> {
            let raw = range
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| DocforgeError::Parse(format!("meta time range lacks `{key}`")))?;
            parse_bound(raw, end_of_day)
                .ok_or_else(|| DocforgeError::Parse(format!("meta time range `{key}`: bad date {raw:?}")))
        };
        let parsed = Self {
            start: bound("start", false)?,
            end: bound("end", true)?,
        };
        if parsed.start > parsed.end {
            return Err(DocforgeError::Parse(format!(
                "meta time range starts after it ends ({} > {})",
                parsed.start, parsed.end
            )));
        }
        Ok(Some(parsed))
    }
}

fn parse_bound(raw: &str, end_of_day: bool) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if end_of_day {
            NaiveTime::from_hms_opt(23, 59, 59)?
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)?
        };
        return Some(date.and_time(time));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}

/// The loaded dataset.
#[derive(Debug)]
pub struct Corpus {
    /// Raw `meta` object, if the file had one.
    pub meta: Value,
    pub time_range: Option<TimeRange>,
    pub documents: Vec<Document>,
    /// Records that failed validation, in input order.
    pub rejected: Vec<DocumentFailure>,
}

impl Corpus {
    /// Read and parse a corpus file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            DocforgeError::Parse(format!("cannot read corpus {}: {e}", path.display()))
        })?;
        Self::from_json_str(&data)
    }

    /// Parse a corpus from its JSON text.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(data)
            .map_err(|e| DocforgeError::Parse(format!("corpus is not valid JSON: {e}")))?;

        let entries = root
            .get("documents")
            .and_then(Value::as_array)
            .ok_or_else(|| DocforgeError::Parse("corpus has no `documents` array".into()))?;

        let meta = root.get("meta").cloned().unwrap_or(Value::Null);
        let time_range = TimeRange::from_meta(&meta)?;

        let mut documents = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for (index, entry) in entries.iter().enumerate() {
            let label = entry
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("documents[{index}]"));

            match parse_document(entry, &label, time_range.as_ref()) {
                Ok(doc) => {
                    if !seen.insert(doc.id.clone()) {
                        warn!(id = %doc.id, "duplicate document identifier");
                        rejected.push(DocumentFailure::new(
                            &doc.id,
                            DocforgeError::invalid_document(&doc.id, "duplicate identifier"),
                        ));
                        continue;
                    }
                    debug!(id = %doc.id, kind = %doc.kind(), "document loaded");
                    documents.push(doc);
                }
                Err(err) => {
                    warn!(id = %label, error = %err, "document rejected");
                    rejected.push(DocumentFailure::new(label, err));
                }
            }
        }

        info!(
            loaded = documents.len(),
            rejected = rejected.len(),
            "corpus parsed"
        );

        Ok(Self {
            meta,
            time_range,
            documents,
            rejected,
        })
    }

    /// True when no two loaded documents share an identifier.
    pub fn ids_unique(&self) -> bool {
        let ids: HashSet<&str> = self.documents.iter().map(|d| d.id.as_str()).collect();
        ids.len() == self.documents.len()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

// -- Raw serde model -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDocument {
    id: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    format: Option<String>,
    timestamp: String,
    author: String,
    #[serde(default)]
    author_email: Option<String>,
    #[serde(default)]
    recipients: Vec<RawPerson>,
    #[serde(default)]
    cc: Vec<RawPerson>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    sections: Vec<RawSection>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    figures: Option<Value>,
    #[serde(default)]
    sheets: Option<Vec<RawSheet>>,
    #[serde(default)]
    slides: Vec<RawSlide>,
    #[serde(default)]
    attendees: Vec<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    discussion_points: Vec<String>,
    #[serde(default)]
    action_items: Vec<RawActionItem>,
    #[serde(default)]
    clients_mentioned: Vec<Value>,
    #[serde(default)]
    planted_facts: Vec<Value>,
    #[serde(default, alias = "ocr_difficulty")]
    pdf_difficulty: Option<String>,
    #[serde(default)]
    requires_ocr: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPerson {
    Mailbox { name: String, email: String },
    Address(String),
}

impl From<RawPerson> for Person {
    fn from(raw: RawPerson) -> Self {
        match raw {
            RawPerson::Mailbox { name, email } => Person { name, email },
            RawPerson::Address(email) => Person {
                name: String::new(),
                email,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        Table {
            columns: raw.columns,
            rows: raw
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(cell_from_json).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSection {
    heading: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    table: Option<RawTable>,
}

#[derive(Debug, Deserialize)]
struct RawSheet {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawSlide {
    #[serde(default, rename = "type")]
    layout: Option<String>,
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    bullets: Vec<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawActionItem {
    task: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    due: Option<String>,
}

// -- Conversion ------------------------------------------------------------

fn cell_from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

fn value_to_label(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Identifiers become file names, so they are restricted to a portable
/// character set and may not start with a dot.
pub fn validate_id(id: &str) -> std::result::Result<(), String> {
    if id.is_empty() {
        return Err("identifier is empty".into());
    }
    if id.starts_with('.') {
        return Err(format!("identifier {id:?} starts with a dot"));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(format!("identifier {id:?} contains {bad:?}"));
    }
    Ok(())
}

fn parse_document(entry: &Value, label: &str, range: Option<&TimeRange>) -> Result<Document> {
    let raw: RawDocument = serde_json::from_value(entry.clone())
        .map_err(|e| DocforgeError::invalid_document(label, e.to_string()))?;
    let id = raw.id.clone();

    validate_id(&id).map_err(|reason| DocforgeError::invalid_document(&id, reason))?;

    let kind = DocumentKind::classify(&raw.type_name, raw.format.as_deref()).ok_or_else(|| {
        DocforgeError::invalid_document(
            &id,
            format!(
                "unknown document type {:?} (format {:?})",
                raw.type_name, raw.format
            ),
        )
    })?;

    let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp).map_err(|e| {
        DocforgeError::invalid_document(&id, format!("timestamp {:?}: {e}", raw.timestamp))
    })?;

    if let Some(range) = range {
        if !range.contains(&timestamp) {
            return Err(DocforgeError::invalid_document(
                &id,
                format!(
                    "timestamp {} outside the corpus range {} .. {}",
                    raw.timestamp, range.start, range.end
                ),
            ));
        }
    }

    let require = |field: Option<String>, name: &str| -> Result<String> {
        field.ok_or_else(|| {
            DocforgeError::invalid_document(&id, format!("{kind} document requires `{name}`"))
        })
    };

    let type_name = raw.type_name.clone();
    let author = raw.author.clone();
    let clients_mentioned = raw.clients_mentioned.into_iter().map(value_to_label).collect();
    let planted_facts = raw.planted_facts.into_iter().map(value_to_label).collect();

    let body = match kind {
        DocumentKind::Email => {
            if raw.recipients.is_empty() {
                return Err(DocforgeError::invalid_document(
                    &id,
                    "email document requires at least one recipient",
                ));
            }
            DocumentBody::Email(EmailBody {
                subject: require(raw.subject, "subject")?,
                from: Person {
                    name: raw.author.clone(),
                    email: require(raw.author_email, "author_email")?,
                },
                recipients: raw.recipients.into_iter().map(Person::from).collect(),
                cc: raw.cc.into_iter().map(Person::from).collect(),
                body: require(raw.body.or(raw.content), "body")?,
            })
        }
        DocumentKind::Report | DocumentKind::Proposal => {
            let report = ReportBody {
                title: require(raw.title, "title")?,
                sections: raw.sections.into_iter().map(section_from_raw).collect(),
                content: raw.content,
                figures: parse_figures(raw.figures, &id)?,
            };
            if kind == DocumentKind::Proposal {
                DocumentBody::Proposal(report)
            } else {
                DocumentBody::Report(report)
            }
        }
        DocumentKind::MeetingNote => DocumentBody::MeetingNote(MeetingNoteBody {
            title: require(raw.title, "title")?,
            attendees: raw.attendees,
            location: raw.location,
            content: raw.content.unwrap_or_default(),
            discussion_points: raw.discussion_points,
            action_items: raw
                .action_items
                .into_iter()
                .map(|item| ActionItem {
                    task: item.task,
                    owner: item.owner,
                    due: item.due,
                })
                .collect(),
        }),
        DocumentKind::Spreadsheet => {
            let sheets = raw.sheets.ok_or_else(|| {
                DocforgeError::invalid_document(&id, "spreadsheet document requires `sheets`")
            })?;
            DocumentBody::Spreadsheet(SpreadsheetBody {
                title: raw.title.unwrap_or_else(|| id.clone()),
                sheets: sheets
                    .into_iter()
                    .map(|sheet| Sheet {
                        name: sheet.name,
                        table: Table::from(RawTable {
                            columns: sheet.columns,
                            rows: sheet.rows,
                        }),
                    })
                    .collect(),
            })
        }
        DocumentKind::Presentation => DocumentBody::Presentation(PresentationBody {
            title: require(raw.title, "title")?,
            subtitle: raw.subtitle,
            slides: raw
                .slides
                .into_iter()
                .map(|slide| Slide {
                    layout: match slide.layout.as_deref() {
                        Some("title") => SlideLayout::Title,
                        _ => SlideLayout::Content,
                    },
                    title: slide.title,
                    subtitle: slide.subtitle,
                    bullets: slide.bullets,
                    content: slide.content,
                })
                .collect(),
            sections: raw.sections.into_iter().map(section_from_raw).collect(),
        }),
        DocumentKind::PdfScan => {
            let difficulty = match raw.pdf_difficulty.as_deref() {
                None => OcrDifficulty::Easy,
                Some(value) => OcrDifficulty::parse(value).ok_or_else(|| {
                    DocforgeError::invalid_document(
                        &id,
                        format!("unknown pdf difficulty {value:?}"),
                    )
                })?,
            };
            DocumentBody::PdfScan(ScanBody {
                title: require(raw.title, "title")?,
                content: require(raw.content, "content")?,
                difficulty,
                requires_ocr: raw.requires_ocr.unwrap_or(true),
            })
        }
    };

    Ok(Document {
        id,
        type_name,
        timestamp,
        author,
        clients_mentioned,
        planted_facts,
        body,
    })
}

fn section_from_raw(raw: RawSection) -> Section {
    Section {
        heading: raw.heading,
        content: raw.content,
        table: raw.table.map(Table::from),
    }
}

/// Figures arrive either as an object (`{"label": value}`) or as a list of
/// `{"label", "value"}` pairs.
fn parse_figures(raw: Option<Value>, id: &str) -> Result<Vec<Figure>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(label, value)| Figure {
                label,
                value: cell_from_json(value),
            })
            .collect()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| {
                let label = item
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        DocforgeError::invalid_document(id, "figure entry lacks `label`")
                    })?;
                let value = item.get("value").cloned().unwrap_or(Value::Null);
                Ok(Figure {
                    label,
                    value: cell_from_json(value),
                })
            })
            .collect(),
        Some(other) => Err(DocforgeError::invalid_document(
            id,
            format!("`figures` must be an object or a list, got {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;

    const SAMPLE: &str = r#"{
        "meta": { "time_range": { "start": "2023-06-01", "end": "2024-07-31" } },
        "documents": [
            {
                "id": "doc_007",
                "type": "email_internal",
                "format": "eml",
                "timestamp": "2023-06-15T10:00:00+02:00",
                "author": "Anna Kowalska",
                "author_email": "anna.kowalska@example.pl",
                "recipients": [{ "name": "Piotr Nowak", "email": "piotr.nowak@example.pl" }],
                "subject": "Budżet Q3",
                "body": "Cześć Piotr,\nprzesyłam budżet.",
                "clients_mentioned": ["Mobilex"],
                "planted_facts": ["budget_q3"]
            },
            {
                "id": "doc_020",
                "type": "spreadsheet_budget",
                "timestamp": "2023-09-01T09:00:00+02:00",
                "author": "Anna Kowalska",
                "title": "Budget",
                "sheets": [{ "name": "Q3", "columns": ["Item", "Net", "VAT"], "rows": [["Hosting", 25500.0, 5865.0]] }]
            },
            {
                "id": "doc_101",
                "type": "invoice",
                "format": "pdf",
                "pdf_difficulty": "hard",
                "timestamp": "2024-02-10T12:00:00+01:00",
                "author": "Biuro",
                "title": "Faktura VAT 12/2024",
                "content": "Faktura VAT nr 12/2024"
            }
        ]
    }"#;

    #[test]
    fn loads_typed_documents() {
        let corpus = Corpus::from_json_str(SAMPLE).unwrap();
        assert_eq!(corpus.len(), 3);
        assert!(corpus.rejected.is_empty());
        assert!(corpus.ids_unique());

        let email = corpus.get("doc_007").unwrap();
        assert_eq!(email.kind(), DocumentKind::Email);
        assert_eq!(email.title(), "Budżet Q3");
        assert_eq!(email.timestamp.to_rfc3339(), "2023-06-15T10:00:00+02:00");
        assert_eq!(email.clients_mentioned, vec!["Mobilex".to_string()]);

        let sheet = corpus.get("doc_020").unwrap();
        match &sheet.body {
            DocumentBody::Spreadsheet(body) => {
                assert_eq!(body.sheets[0].table.rows[0][1], CellValue::Number(25500.0));
                assert_eq!(body.sheets[0].table.rows[0][0], CellValue::Text("Hosting".into()));
            }
            other => panic!("unexpected body {other:?}"),
        }

        let scan = corpus.get("doc_101").unwrap();
        match &scan.body {
            DocumentBody::PdfScan(body) => {
                assert_eq!(body.difficulty, OcrDifficulty::Hard);
                assert!(body.requires_ocr);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_fatal() {
        let err = Corpus::from_json_str("{ not json").unwrap_err();
        assert_eq!(err.class(), ErrorClass::Parse);

        let err = Corpus::from_json_str(r#"{ "meta": {} }"#).unwrap_err();
        assert!(err.to_string().contains("documents"));
    }

    #[test]
    fn missing_required_field_rejects_only_that_document() {
        let json = r#"{ "documents": [
            { "id": "doc_001", "type": "email", "timestamp": "2023-07-01T08:00:00+02:00",
              "author": "A", "author_email": "a@example.pl",
              "recipients": [{ "name": "B", "email": "b@example.pl" }], "body": "x" },
            { "id": "doc_002", "type": "report", "timestamp": "2023-07-01T08:00:00+02:00",
              "author": "A", "title": "Raport", "content": "Treść" }
        ] }"#;
        let corpus = Corpus::from_json_str(json).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.rejected.len(), 1);
        assert_eq!(corpus.rejected[0].id, "doc_001");
        assert!(corpus.rejected[0].error.to_string().contains("subject"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"{ "documents": [
            { "id": "doc_001", "type": "meeting_notes", "timestamp": "2023-07-01T08:00:00+02:00",
              "author": "A", "title": "Standup" },
            { "id": "doc_001", "type": "meeting_notes", "timestamp": "2023-07-02T08:00:00+02:00",
              "author": "A", "title": "Standup 2" }
        ] }"#;
        let corpus = Corpus::from_json_str(json).unwrap();
        assert_eq!(corpus.len(), 1);
        assert!(corpus.ids_unique());
        assert!(corpus.rejected[0].error.to_string().contains("duplicate"));
    }

    #[test]
    fn timestamp_outside_range_is_rejected() {
        let json = r#"{
            "meta": { "date_range": { "start": "2023-06-01", "end": "2024-07-31" } },
            "documents": [
                { "id": "doc_001", "type": "meeting_notes", "timestamp": "2024-07-31T23:30:00+02:00",
                  "author": "A", "title": "Late but inside" },
                { "id": "doc_002", "type": "meeting_notes", "timestamp": "2022-12-01T08:00:00+01:00",
                  "author": "A", "title": "Too early" }
            ] }"#;
        let corpus = Corpus::from_json_str(json).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.rejected[0].id, "doc_002");
    }

    #[test]
    fn timestamp_without_offset_is_rejected() {
        let json = r#"{ "documents": [
            { "id": "doc_001", "type": "meeting_notes", "timestamp": "2023-07-01T08:00:00",
              "author": "A", "title": "Standup" }
        ] }"#;
        let corpus = Corpus::from_json_str(json).unwrap();
        assert!(corpus.is_empty());
        assert_eq!(corpus.rejected[0].error.class(), ErrorClass::Parse);
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        assert!(validate_id("doc_001").is_ok());
        assert!(validate_id("scan-2024.03").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id(".hidden").is_err());
        assert!(validate_id("a/b").is_err());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let json = r#"{ "documents": [
            { "id": "doc_001", "type": "hologram", "timestamp": "2023-07-01T08:00:00+02:00",
              "author": "A", "title": "?" }
        ] }"#;
        let corpus = Corpus::from_json_str(json).unwrap();
        assert!(corpus.rejected[0].error.to_string().contains("unknown document type"));
    }

    #[test]
    fn figures_accept_object_and_list() {
        let object = parse_figures(
            Some(serde_json::json!({ "Revenue": 31365.0, "Margin": "12%" })),
            "doc_001",
        )
        .unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object[0].value, CellValue::Number(31365.0));

        let list = parse_figures(
            Some(serde_json::json!([{ "label": "Revenue", "value": 10 }])),
            "doc_001",
        )
        .unwrap();
        assert_eq!(list[0].label, "Revenue");
        assert_eq!(list[0].value.as_number(), Some(10.0));

        assert!(parse_figures(Some(serde_json::json!(5)), "doc_001").is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let corpus = Corpus::load(&path).unwrap();
        assert_eq!(corpus.len(), 3);
        assert!(corpus.time_range.is_some());

        let missing = Corpus::load(dir.path().join("nope.json")).unwrap_err();
        assert_eq!(missing.class(), ErrorClass::Parse);
    }
}
