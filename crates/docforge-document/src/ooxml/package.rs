// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OPC package plumbing: the zip container, `[Content_Types].xml` and
// relationship parts shared by DOCX, XLSX and PPTX.

use std::io::{Cursor, Read, Write};

use docforge_core::error::{DocforgeError, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use super::xml::XmlWriter;

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_EXTENDED_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// One `<Relationship>` entry.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub id: String,
    pub rel_type: &'static str,
    pub target: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type,
            target: target.into(),
        }
    }
}

/// Accumulates parts into an in-memory zip.
///
/// Every entry gets the zip epoch as its modification time, so the same
/// parts always produce the same archive bytes.
pub struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    overrides: Vec<(String, &'static str)>,
}

impl PackageWriter {
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            overrides: Vec::new(),
        }
    }

    /// Add a part and record its content type for `[Content_Types].xml`.
    pub fn add_part(&mut self, name: &str, content_type: &'static str, bytes: &[u8]) -> Result<()> {
        self.overrides.push((format!("/{name}"), content_type));
        self.add_raw(name, bytes)
    }

    /// Add a part covered by a default extension mapping (`.rels`).
    pub fn add_raw(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.zip
            .start_file(name, self.options)
            .map_err(|e| DocforgeError::Package(format!("zip entry {name}: {e}")))?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    pub fn add_relationships(&mut self, name: &str, rels: &[Relationship]) -> Result<()> {
        let bytes = relationships_xml(rels)?;
        self.add_raw(name, &bytes)
    }

    /// Add `docProps/app.xml` and the root relationships pointing at the
    /// main part and both property parts.
    pub fn add_package_rels(&mut self, main_part: &str) -> Result<()> {
        let mut xml = XmlWriter::new()?;
        xml.start(
            "Properties",
            &[
                (
                    "xmlns",
                    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
                ),
                (
                    "xmlns:vt",
                    "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
                ),
            ],
        )?;
        xml.element("Application", &[], "Docforge")?;
        xml.end("Properties")?;
        self.add_part("docProps/app.xml", CT_EXTENDED_PROPERTIES, &xml.into_bytes())?;

        self.add_relationships(
            "_rels/.rels",
            &[
                Relationship::new("rId1", REL_OFFICE_DOCUMENT, main_part),
                Relationship::new("rId2", REL_CORE_PROPERTIES, "docProps/core.xml"),
                Relationship::new("rId3", REL_EXTENDED_PROPERTIES, "docProps/app.xml"),
            ],
        )
    }

    pub fn add_core_properties(&mut self, bytes: &[u8]) -> Result<()> {
        self.add_part("docProps/core.xml", CT_CORE_PROPERTIES, bytes)
    }

    /// Write `[Content_Types].xml` and close the archive.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let content_types = content_types_xml(&self.overrides)?;
        self.add_raw("[Content_Types].xml", &content_types)?;
        let cursor = self
            .zip
            .finish()
            .map_err(|e| DocforgeError::Package(format!("finalise zip: {e}")))?;
        Ok(cursor.into_inner())
    }
}

impl Default for PackageWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn content_types_xml(overrides: &[(String, &'static str)]) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "Types",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/content-types",
        )],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    for (part, content_type) in overrides {
        xml.empty(
            "Override",
            &[("PartName", part.as_str()), ("ContentType", content_type)],
        )?;
    }
    xml.end("Types")?;
    Ok(xml.into_bytes())
}

fn relationships_xml(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut xml = XmlWriter::new()?;
    xml.start(
        "Relationships",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )],
    )?;
    for rel in rels {
        xml.empty(
            "Relationship",
            &[
                ("Id", rel.id.as_str()),
                ("Type", rel.rel_type),
                ("Target", rel.target.as_str()),
            ],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.into_bytes())
}

// -- Reading ----------------------------------------------------------------

/// Read one part of a package as UTF-8 text.
pub fn read_part(package: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(package))
        .map_err(|e| DocforgeError::Package(format!("open zip: {e}")))?;
    let mut file = archive
        .by_name(name)
        .map_err(|e| DocforgeError::Package(format!("part {name}: {e}")))?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(text)
}

/// Names of all parts in archive order.
pub fn part_names(package: &[u8]) -> Result<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(package))
        .map_err(|e| DocforgeError::Package(format!("open zip: {e}")))?;
    Ok(archive.file_names().map(str::to_owned).collect())
}
