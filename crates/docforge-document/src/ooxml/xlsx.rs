// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spreadsheet renderer. Numbers are written as numeric cells (`<v>`) so
// they read back as numbers; text uses inline strings.

use std::collections::{BTreeMap, HashSet};

use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{
    Artifact, CellValue, Document, DocumentBody, DocumentKind, Sheet, SpreadsheetBody,
};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use super::core_props::CoreProperties;
use super::package::{PackageWriter, Relationship, read_part};
use super::xml::{XmlWriter, xml_error};
use crate::render::{Renderer, wrong_body};

const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Excel's sheet-name length limit.
const MAX_SHEET_NAME: usize = 31;

/// Style 1 is the header: bold on a light grey solid fill.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font><font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>
<fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="FFDDDDDD"/><bgColor indexed="64"/></patternFill></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1"/></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

/// Renders spreadsheet documents as `.xlsx`, one worksheet per sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxRenderer;

impl Renderer for XlsxRenderer {
    fn kinds(&self) -> &'static [DocumentKind] {
        &[DocumentKind::Spreadsheet]
    }

    #[instrument(skip_all, fields(id = %document.id))]
    fn render(&self, document: &Document) -> Result<Artifact> {
        let DocumentBody::Spreadsheet(workbook) = &document.body else {
            return Err(wrong_body(document, "spreadsheet"));
        };
        check_workbook(document, workbook)?;

        let names = sheet_names(&workbook.sheets);
        let mut package = PackageWriter::new();

        let mut workbook_rels = Vec::with_capacity(names.len() + 1);
        for (index, sheet) in workbook.sheets.iter().enumerate() {
            let part = format!("xl/worksheets/sheet{}.xml", index + 1);
            package.add_part(&part, CT_WORKSHEET, &worksheet_xml(sheet)?)?;
            workbook_rels.push(Relationship::new(
                format!("rId{}", index + 1),
                REL_WORKSHEET,
                format!("worksheets/sheet{}.xml", index + 1),
            ));
        }
        workbook_rels.push(Relationship::new(
            format!("rId{}", names.len() + 1),
            REL_STYLES,
            "styles.xml",
        ));

        package.add_part("xl/workbook.xml", CT_WORKBOOK, &workbook_xml(&names)?)?;
        package.add_part("xl/styles.xml", CT_STYLES, STYLES_XML.as_bytes())?;
        package.add_relationships("xl/_rels/workbook.xml.rels", &workbook_rels)?;
        package.add_core_properties(&CoreProperties::for_document(document).to_xml()?)?;
        package.add_package_rels("xl/workbook.xml")?;
        let bytes = package.finish()?;

        debug!(sheets = names.len(), bytes_len = bytes.len(), "xlsx rendered");
        Ok(Artifact::new(&document.id, DocumentKind::Spreadsheet, bytes))
    }
}

fn check_workbook(document: &Document, workbook: &SpreadsheetBody) -> Result<()> {
    if workbook.sheets.is_empty() {
        return Err(DocforgeError::render(&document.id, "spreadsheet has no sheets"));
    }
    for sheet in &workbook.sheets {
        if sheet.table.columns.is_empty() {
            return Err(DocforgeError::render(
                &document.id,
                format!("sheet {:?} has no columns", sheet.name),
            ));
        }
        if let Some(row) = sheet
            .table
            .rows
            .iter()
            .find(|row| row.len() > sheet.table.columns.len())
        {
            return Err(DocforgeError::render(
                &document.id,
                format!(
                    "sheet {:?} has a row of {} cells but only {} columns",
                    sheet.name,
                    row.len(),
                    sheet.table.columns.len()
                ),
            ));
        }
    }
    Ok(())
}

/// Apply Excel's naming rules: no `[]:*?/\`, no surrounding apostrophes,
/// at most 31 characters, unique ignoring case.
pub fn sheet_names(sheets: &[Sheet]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(sheets.len());

    for (index, sheet) in sheets.iter().enumerate() {
        let cleaned: String = sheet
            .name
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') && !c.is_control())
            .collect();
        let cleaned = cleaned.trim().trim_matches('\'').trim();
        let base: String = if cleaned.is_empty() {
            format!("Sheet{}", index + 1)
        } else {
            cleaned.chars().take(MAX_SHEET_NAME).collect()
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while !seen.insert(candidate.to_lowercase()) {
            let suffix = format!(" ({n})");
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = base.chars().take(keep).collect::<String>() + &suffix;
            n += 1;
        }
        names.push(candidate);
    }
    names
}

fn workbook_xml(names: &[String]) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_R)])?;
    xml.start("sheets", &[])?;
    for (index, name) in names.iter().enumerate() {
        let sheet_id = (index + 1).to_string();
        let rel_id = format!("rId{}", index + 1);
        xml.empty(
            "sheet",
            &[
                ("name", name.as_str()),
                ("sheetId", &sheet_id),
                ("r:id", &rel_id),
            ],
        )?;
    }
    xml.end("sheets")?;
    xml.end("workbook")?;
    Ok(xml.into_bytes())
}

fn worksheet_xml(sheet: &Sheet) -> Result<Vec<u8>> {
    let table = &sheet.table;
    let mut xml = XmlWriter::new()?;
    xml.start("worksheet", &[("xmlns", NS_MAIN), ("xmlns:r", NS_R)])?;

    // Header row stays visible while scrolling.
    xml.start("sheetViews", &[])?;
    xml.start("sheetView", &[("workbookViewId", "0")])?;
    xml.empty(
        "pane",
        &[
            ("ySplit", "1"),
            ("topLeftCell", "A2"),
            ("activePane", "bottomLeft"),
            ("state", "frozen"),
        ],
    )?;
    xml.end("sheetView")?;
    xml.end("sheetViews")?;

    xml.start("cols", &[])?;
    for (index, width) in column_widths(sheet).iter().enumerate() {
        let col = (index + 1).to_string();
        let width = format!("{width:.1}");
        xml.empty(
            "col",
            &[
                ("min", &col),
                ("max", &col),
                ("width", &width),
                ("customWidth", "1"),
            ],
        )?;
    }
    xml.end("cols")?;

    xml.start("sheetData", &[])?;
    xml.start("row", &[("r", "1")])?;
    for (col, header) in table.columns.iter().enumerate() {
        let reference = cell_reference(col, 1);
        xml.start(
            "c",
            &[("r", &reference), ("s", "1"), ("t", "inlineStr")],
        )?;
        inline_string(&mut xml, header)?;
        xml.end("c")?;
    }
    xml.end("row")?;

    for (row_index, row) in table.rows.iter().enumerate() {
        let row_number = row_index as u32 + 2;
        xml.start("row", &[("r", &row_number.to_string())])?;
        for (col, value) in row.iter().enumerate() {
            write_cell(&mut xml, &cell_reference(col, row_number), value)?;
        }
        xml.end("row")?;
    }
    xml.end("sheetData")?;

    xml.end("worksheet")?;
    Ok(xml.into_bytes())
}

fn write_cell(xml: &mut XmlWriter, reference: &str, value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => Ok(()),
        CellValue::Number(n) => {
            xml.start("c", &[("r", reference)])?;
            xml.element("v", &[], &n.to_string())?;
            xml.end("c")
        }
        CellValue::Bool(b) => {
            xml.start("c", &[("r", reference), ("t", "b")])?;
            xml.element("v", &[], if *b { "1" } else { "0" })?;
            xml.end("c")
        }
        CellValue::Text(text) => {
            xml.start("c", &[("r", reference), ("t", "inlineStr")])?;
            inline_string(xml, text)?;
            xml.end("c")
        }
    }
}

fn inline_string(xml: &mut XmlWriter, text: &str) -> Result<()> {
    xml.start("is", &[])?;
    xml.element("t", &[("xml:space", "preserve")], text)?;
    xml.end("is")
}

/// Width in characters, from the longest rendered value in each column.
fn column_widths(sheet: &Sheet) -> Vec<f32> {
    sheet
        .table
        .columns
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = sheet
                .table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.display().chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            (longest as f32 + 2.0).clamp(8.0, 60.0)
        })
        .collect()
}

/// Zero-based column index to letters: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn cell_reference(col: usize, row: u32) -> String {
    format!("{}{row}", column_name(col))
}

// -- Reading ----------------------------------------------------------------

/// Sheet names in workbook order.
pub fn read_sheet_names(package: &[u8]) -> Result<Vec<String>> {
    let text = read_part(package, "xl/workbook.xml")?;
    let mut reader = Reader::from_str(&text);
    let mut names = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"sheet" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        names.push(attr.unescape_value().map_err(xml_error)?.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}

/// Cells of the 1-based worksheet `sheet`, keyed by reference (`B2`).
/// Numeric cells come back as [`CellValue::Number`].
pub fn read_cells(package: &[u8], sheet: usize) -> Result<BTreeMap<String, CellValue>> {
    let text = read_part(package, &format!("xl/worksheets/sheet{sheet}.xml"))?;
    let mut reader = Reader::from_str(&text);

    let mut cells = BTreeMap::new();
    let mut reference = String::new();
    let mut cell_type = String::new();
    let mut raw: Option<String> = None;
    let mut capture = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"c" => {
                    reference.clear();
                    cell_type.clear();
                    raw = None;
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().map_err(xml_error)?;
                        match attr.key.as_ref() {
                            b"r" => reference = value.into_owned(),
                            b"t" => cell_type = value.into_owned(),
                            _ => {}
                        }
                    }
                }
                b"v" | b"t" => capture = true,
                _ => {}
            },
            Event::Text(t) if capture => {
                raw.get_or_insert_with(String::new)
                    .push_str(&t.unescape().map_err(xml_error)?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    let value = match (cell_type.as_str(), raw.take()) {
                        (_, None) => CellValue::Empty,
                        ("inlineStr" | "str" | "s", Some(text)) => CellValue::Text(text),
                        ("b", Some(text)) => CellValue::Bool(text == "1"),
                        (_, Some(text)) => text.parse::<f64>().map(CellValue::Number).map_err(|e| {
                            DocforgeError::Package(format!("cell {reference}: {text:?} is not numeric: {e}"))
                        })?,
                    };
                    cells.insert(std::mem::take(&mut reference), value);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(cells)
}
