// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-processing renderer for reports and proposals.

use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{
    Artifact, CellValue, Document, DocumentBody, DocumentKind, ReportBody, Section, Table,
};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use super::core_props::CoreProperties;
use super::package::{PackageWriter, Relationship, read_part};
use super::xml::{XmlWriter, xml_error};
use crate::render::{Renderer, wrong_body};
use crate::text::{paragraphs, split_markdown_sections};

const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// A4 in twentieths of a point, one-inch margins.
const PAGE_WIDTH_TWIPS: u32 = 11906;
const PAGE_HEIGHT_TWIPS: u32 = 16838;
const MARGIN_TWIPS: u32 = 1440;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:lang w:val="pl-PL"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="259" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:sz w:val="52"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style>
</w:styles>"#;

/// Renders reports and proposals as `.docx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl Renderer for DocxRenderer {
    fn kinds(&self) -> &'static [DocumentKind] {
        &[DocumentKind::Report, DocumentKind::Proposal]
    }

    #[instrument(skip_all, fields(id = %document.id))]
    fn render(&self, document: &Document) -> Result<Artifact> {
        let report = match &document.body {
            DocumentBody::Report(report) | DocumentBody::Proposal(report) => report,
            _ => return Err(wrong_body(document, "report")),
        };

        let sections = resolve_sections(document, report)?;
        let body = document_xml(document, report, &sections)?;

        let mut package = PackageWriter::new();
        package.add_part("word/document.xml", CT_DOCUMENT, &body)?;
        package.add_part("word/styles.xml", CT_STYLES, STYLES_XML.as_bytes())?;
        package.add_relationships(
            "word/_rels/document.xml.rels",
            &[Relationship::new("rId1", REL_STYLES, "styles.xml")],
        )?;
        package.add_core_properties(&CoreProperties::for_document(document).to_xml()?)?;
        package.add_package_rels("word/document.xml")?;
        let bytes = package.finish()?;

        debug!(
            sections = sections.len(),
            figures = report.figures.len(),
            bytes_len = bytes.len(),
            "docx rendered"
        );
        Ok(Artifact::new(&document.id, document.kind(), bytes))
    }
}

/// Explicit sections win; otherwise free content is split on headings.
fn resolve_sections(document: &Document, report: &ReportBody) -> Result<Vec<Section>> {
    let sections = if !report.sections.is_empty() {
        report.sections.clone()
    } else if let Some(content) = &report.content {
        split_markdown_sections(content)
    } else {
        Vec::new()
    };

    if sections.is_empty() && report.figures.is_empty() {
        return Err(DocforgeError::render(
            &document.id,
            "report has no sections, content or figures",
        ));
    }
    for section in &sections {
        if let Some(table) = &section.table {
            check_table(document, table)?;
        }
    }
    Ok(sections)
}

fn check_table(document: &Document, table: &Table) -> Result<()> {
    if table.columns.is_empty() {
        return Err(DocforgeError::render(&document.id, "table has no columns"));
    }
    if let Some((i, row)) = table
        .rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() > table.columns.len())
    {
        return Err(DocforgeError::render(
            &document.id,
            format!(
                "table row {} has {} cells but only {} columns",
                i + 1,
                row.len(),
                table.columns.len()
            ),
        ));
    }
    Ok(())
}

fn document_xml(document: &Document, report: &ReportBody, sections: &[Section]) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start("w:document", &[("xmlns:w", NS_W), ("xmlns:r", NS_R)])?;
    xml.start("w:body", &[])?;

    styled_paragraph(&mut xml, Some("Title"), &report.title)?;

    let byline = format!(
        "Author: {}\nDate: {}",
        document.author,
        document.timestamp.format("%Y-%m-%d")
    );
    italic_paragraph(&mut xml, &byline)?;

    for section in sections {
        if !section.heading.is_empty() {
            styled_paragraph(&mut xml, Some("Heading1"), &section.heading)?;
        }
        for paragraph in paragraphs(&section.content) {
            styled_paragraph(&mut xml, None, &paragraph)?;
        }
        if let Some(table) = &section.table {
            write_table(&mut xml, table)?;
        }
    }

    if !report.figures.is_empty() {
        styled_paragraph(&mut xml, Some("Heading1"), "Key figures")?;
        let table = Table {
            columns: vec!["Figure".to_string(), "Value".to_string()],
            rows: report
                .figures
                .iter()
                .map(|f| vec![CellValue::Text(f.label.clone()), f.value.clone()])
                .collect(),
        };
        write_table(&mut xml, &table)?;
    }

    let width = PAGE_WIDTH_TWIPS.to_string();
    let height = PAGE_HEIGHT_TWIPS.to_string();
    let margin = MARGIN_TWIPS.to_string();
    xml.start("w:sectPr", &[])?;
    xml.empty("w:pgSz", &[("w:w", &width), ("w:h", &height)])?;
    xml.empty(
        "w:pgMar",
        &[
            ("w:top", &margin),
            ("w:right", &margin),
            ("w:bottom", &margin),
            ("w:left", &margin),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    xml.end("w:sectPr")?;

    xml.end("w:body")?;
    xml.end("w:document")?;
    Ok(xml.into_bytes())
}

/// A paragraph whose single newlines become line breaks.
fn styled_paragraph(xml: &mut XmlWriter, style: Option<&str>, text: &str) -> Result<()> {
    xml.start("w:p", &[])?;
    if let Some(style) = style {
        xml.start("w:pPr", &[])?;
        xml.empty("w:pStyle", &[("w:val", style)])?;
        xml.end("w:pPr")?;
    }
    write_runs(xml, text, false)?;
    xml.end("w:p")
}

fn italic_paragraph(xml: &mut XmlWriter, text: &str) -> Result<()> {
    xml.start("w:p", &[])?;
    write_runs(xml, text, true)?;
    xml.end("w:p")
}

fn write_runs(xml: &mut XmlWriter, text: &str, italic: bool) -> Result<()> {
    for (i, line) in text.lines().enumerate() {
        xml.start("w:r", &[])?;
        if italic {
            xml.start("w:rPr", &[])?;
            xml.empty("w:i", &[])?;
            xml.end("w:rPr")?;
        }
        if i > 0 {
            xml.empty("w:br", &[])?;
        }
        xml.element("w:t", &[("xml:space", "preserve")], line)?;
        xml.end("w:r")?;
    }
    Ok(())
}

fn write_table(xml: &mut XmlWriter, table: &Table) -> Result<()> {
    let usable = PAGE_WIDTH_TWIPS - 2 * MARGIN_TWIPS;
    let col_width = (usable / table.columns.len().max(1) as u32).to_string();

    xml.start("w:tbl", &[])?;
    xml.start("w:tblPr", &[])?;
    xml.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
    xml.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
    xml.end("w:tblPr")?;

    xml.start("w:tblGrid", &[])?;
    for _ in &table.columns {
        xml.empty("w:gridCol", &[("w:w", &col_width)])?;
    }
    xml.end("w:tblGrid")?;

    xml.start("w:tr", &[])?;
    for column in &table.columns {
        table_cell(xml, &col_width, column, true)?;
    }
    xml.end("w:tr")?;

    for row in &table.rows {
        xml.start("w:tr", &[])?;
        for index in 0..table.columns.len() {
            let text = row.get(index).map(CellValue::display).unwrap_or_default();
            table_cell(xml, &col_width, &text, false)?;
        }
        xml.end("w:tr")?;
    }
    xml.end("w:tbl")?;

    // Word expects a paragraph between a table and what follows it.
    xml.empty("w:p", &[])
}

fn table_cell(xml: &mut XmlWriter, width: &str, text: &str, bold: bool) -> Result<()> {
    xml.start("w:tc", &[])?;
    xml.start("w:tcPr", &[])?;
    xml.empty("w:tcW", &[("w:w", width), ("w:type", "dxa")])?;
    xml.end("w:tcPr")?;
    xml.start("w:p", &[])?;
    xml.start("w:r", &[])?;
    if bold {
        xml.start("w:rPr", &[])?;
        xml.empty("w:b", &[])?;
        xml.end("w:rPr")?;
    }
    xml.element("w:t", &[("xml:space", "preserve")], text)?;
    xml.end("w:r")?;
    xml.end("w:p")?;
    xml.end("w:tc")
}

/// Plain text of every paragraph in `word/document.xml`, table cells
/// included. Line breaks inside a paragraph come back as `\n`.
pub fn read_paragraphs(package: &[u8]) -> Result<Vec<String>> {
    let text = read_part(package, "word/document.xml")?;
    let mut reader = Reader::from_str(&text);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:br" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\n');
                    }
                }
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = current.as_mut() {
                    p.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}
