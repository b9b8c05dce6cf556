// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `docProps/core.xml`: Dublin Core title, creator and timestamps.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::Document;
use quick_xml::Reader;
use quick_xml::events::Event;

use super::package::read_part;
use super::xml::{XmlWriter, xml_error};

/// Separator between entries of `cp:keywords`, as Office writes it. Client
/// names often carry commas ("Example Sp. z o.o., oddział Kraków").
const KEYWORD_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, PartialEq)]
pub struct CoreProperties {
    pub title: String,
    pub creator: String,
    pub created: DateTime<FixedOffset>,
    pub keywords: Vec<String>,
}

impl CoreProperties {
    /// Properties for a rendered document. Keywords carry the clients the
    /// document mentions.
    pub fn for_document(document: &Document) -> Self {
        Self {
            title: document.title().to_string(),
            creator: document.author.clone(),
            created: document.timestamp,
            keywords: document.clients_mentioned.clone(),
        }
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        // W3CDTF with the original offset, not normalised to UTC.
        let stamp = self.created.to_rfc3339_opts(SecondsFormat::Secs, false);

        let mut xml = XmlWriter::new()?;
        xml.start(
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
                ("xmlns:dcterms", "http://purl.org/dc/terms/"),
                ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
                ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ],
        )?;
        xml.element("dc:title", &[], &self.title)?;
        xml.element("dc:creator", &[], &self.creator)?;
        if !self.keywords.is_empty() {
            xml.element("cp:keywords", &[], &self.keywords.join(KEYWORD_SEPARATOR))?;
        }
        xml.element("cp:lastModifiedBy", &[], &self.creator)?;
        xml.element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
        xml.element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
        xml.end("cp:coreProperties")?;
        Ok(xml.into_bytes())
    }

    /// Read the core properties back out of a package.
    pub fn read(package: &[u8]) -> Result<Self> {
        let text = read_part(package, "docProps/core.xml")?;
        let mut reader = Reader::from_str(&text);

        let mut current: Option<Vec<u8>> = None;
        let mut title = None;
        let mut creator = None;
        let mut created = None;
        let mut keywords = Vec::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => current = Some(e.local_name().as_ref().to_vec()),
                Event::End(_) => current = None,
                Event::Text(t) => {
                    let value = t.unescape().map_err(xml_error)?.into_owned();
                    match current.as_deref() {
                        Some(b"title") => title = Some(value),
                        Some(b"creator") => creator = Some(value),
                        Some(b"created") => created = Some(value),
                        Some(b"keywords") => {
                            keywords = value
                                .split(KEYWORD_SEPARATOR)
                                .map(str::trim)
                                .filter(|k| !k.is_empty())
                                .map(str::to_owned)
                                .collect();
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let created = created
            .ok_or_else(|| DocforgeError::Package("core.xml lacks dcterms:created".into()))?;
        Ok(Self {
            title: title.unwrap_or_default(),
            creator: creator.unwrap_or_default(),
            created: DateTime::parse_from_rfc3339(&created).map_err(|e| {
                DocforgeError::Package(format!("bad dcterms:created {created:?}: {e}"))
            })?,
            keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::package::PackageWriter;

    #[test]
    fn core_properties_round_trip_with_offset() {
        let props = CoreProperties {
            title: "Raport & plan <Q3>".to_string(),
            creator: "Anna Kowalska".to_string(),
            created: DateTime::parse_from_rfc3339("2023-06-15T10:00:00+02:00").unwrap(),
            keywords: vec!["Mobilex".to_string(), "Nordbank".to_string()],
        };
        let mut package = PackageWriter::new();
        package.add_core_properties(&props.to_xml().unwrap()).unwrap();
        let bytes = package.finish().unwrap();

        let read = CoreProperties::read(&bytes).unwrap();
        assert_eq!(read, props);
        assert_eq!(read.created.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn keywords_with_commas_round_trip() {
        let props = CoreProperties {
            title: "Umowa".to_string(),
            creator: "Anna Kowalska".to_string(),
            created: DateTime::parse_from_rfc3339("2023-06-15T10:00:00+02:00").unwrap(),
            keywords: vec![
                "Example Sp. z o.o., oddział Kraków".to_string(),
                "Mobilex".to_string(),
            ],
        };
        let xml = String::from_utf8(props.to_xml().unwrap()).unwrap();
        assert!(xml.contains("<cp:keywords>Example Sp. z o.o., oddział Kraków; Mobilex</cp:keywords>"));

        let mut package = PackageWriter::new();
        package.add_core_properties(&props.to_xml().unwrap()).unwrap();
        let read = CoreProperties::read(&package.finish().unwrap()).unwrap();
        assert_eq!(read.keywords, props.keywords);
    }
}
