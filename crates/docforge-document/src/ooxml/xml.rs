// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thin wrapper over `quick_xml::Writer` for building OOXML parts.

use docforge_core::error::{DocforgeError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Streaming XML builder. Text and attribute values are escaped by
/// quick-xml; characters XML 1.0 forbids are dropped first.
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Start a part with the standalone UTF-8 declaration Office expects.
    pub fn new() -> Result<Self> {
        let mut inner = Writer::new(Vec::new());
        inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { inner })
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = element(name, attrs);
        self.inner.write_event(Event::Start(elem)).map_err(xml_error)
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.inner
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let elem = element(name, attrs);
        self.inner.write_event(Event::Empty(elem)).map_err(xml_error)
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        let clean = sanitize(text);
        self.inner
            .write_event(Event::Text(BytesText::new(&clean)))
            .map_err(xml_error)
    }

    /// `<name attrs>text</name>`
    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut elem = BytesStart::new(name);
    for (key, value) in attrs {
        let clean = sanitize(value);
        elem.push_attribute((*key, clean.as_str()));
    }
    elem
}

pub(crate) fn xml_error(err: impl std::fmt::Display) -> DocforgeError {
    DocforgeError::Package(format!("xml: {err}"))
}

/// Remove characters that are not allowed in XML 1.0 documents.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || c >= '\u{10000}'
        })
        .collect()
}
