// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document information dictionary (`/Info`): text strings and PDF dates.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use docforge_core::types::Document;
use lopdf::{Dictionary, Object, StringFormat};

pub const CREATOR: &str = "docforge";
pub const PRODUCER: &str = "docforge scan synthesizer (lopdf)";

/// Fields written to and read back from the `/Info` dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
}

impl PdfInfo {
    /// Metadata for a scan of `document`. Creation and modification dates
    /// are the document timestamp, not the time of generation.
    pub fn for_document(document: &Document) -> Self {
        Self {
            title: Some(document.title().to_string()),
            author: Some(document.author.clone()),
            keywords: (!document.clients_mentioned.is_empty())
                .then(|| document.clients_mentioned.join("; ")),
            creator: Some(CREATOR.to_string()),
            producer: Some(PRODUCER.to_string()),
            creation_date: Some(document.timestamp),
        }
    }

    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        let fields = [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                dict.set(key, text_string(value));
            }
        }
        if let Some(date) = &self.creation_date {
            let stamp = pdf_date(date);
            dict.set("CreationDate", Object::string_literal(stamp.as_str()));
            dict.set("ModDate", Object::string_literal(stamp));
        }
        dict
    }

    pub fn from_dictionary(dict: &Dictionary) -> Self {
        let text = |key: &[u8]| match dict.get(key) {
            Ok(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
            _ => None,
        };
        Self {
            title: text(b"Title"),
            author: text(b"Author"),
            keywords: text(b"Keywords"),
            creator: text(b"Creator"),
            producer: text(b"Producer"),
            creation_date: text(b"CreationDate").and_then(|d| parse_pdf_date(&d)),
        }
    }
}

/// Encode a text string: a literal when printable ASCII, otherwise UTF-16BE
/// with a byte-order mark in hex form.
pub fn text_string(text: &str) -> Object {
    if text.chars().all(|c| (' '..='~').contains(&c)) {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Inverse of [`text_string`]. Strings without a UTF-16 BOM are treated as
/// single-byte, which matches PDFDocEncoding for the ASCII range.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// `D:YYYYMMDDHHmmSS+HH'mm'`, keeping the original offset.
pub fn pdf_date(date: &DateTime<FixedOffset>) -> String {
    let offset = date.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let minutes = offset.abs() / 60;
    format!(
        "D:{}{sign}{:02}'{:02}'",
        date.format("%Y%m%d%H%M%S"),
        minutes / 60,
        minutes % 60
    )
}

/// Parse a PDF date. Seconds-precision dates with `Z`, no offset or a
/// `+HH'mm'` offset are accepted; anything shorter is rejected.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.strip_prefix("D:").unwrap_or(value);
    let stamp = value.get(..14)?;
    let rest = value.get(14..)?;
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S").ok()?;

    let offset = match rest.chars().next() {
        None | Some('Z') => FixedOffset::east_opt(0)?,
        Some(sign @ ('+' | '-')) => {
            let digits: String = rest[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = digits.get(..2)?.parse().ok()?;
            let minutes: i32 = digits.get(2..4).unwrap_or("00").parse().ok()?;
            let seconds = hours * 3600 + minutes * 60;
            if sign == '-' {
                FixedOffset::west_opt(seconds)?
            } else {
                FixedOffset::east_opt(seconds)?
            }
        }
        Some(_) => return None,
    };
    naive.and_local_timezone(offset).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_dates_keep_their_offset() {
        let date = DateTime::parse_from_rfc3339("2023-06-15T10:00:00+02:00").unwrap();
        let encoded = pdf_date(&date);
        assert_eq!(encoded, "D:20230615100000+02'00'");
        assert_eq!(parse_pdf_date(&encoded), Some(date));

        let west = DateTime::parse_from_rfc3339("2023-01-02T08:15:00-05:30").unwrap();
        assert_eq!(pdf_date(&west), "D:20230102081500-05'30'");
        assert_eq!(parse_pdf_date(&pdf_date(&west)), Some(west));
    }

    #[test]
    fn utc_and_short_dates() {
        let utc = parse_pdf_date("D:20230615080000Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2023-06-15T08:00:00+00:00");
        assert_eq!(parse_pdf_date("D:2023"), None);
    }

    #[test]
    fn non_ascii_titles_use_utf16() {
        let object = text_string("Budżet Q3");
        let Object::String(bytes, format) = &object else {
            panic!("expected a string object");
        };
        assert_eq!(*format, StringFormat::Hexadecimal);
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(bytes), "Budżet Q3");

        let Object::String(plain, _) = text_string("Invoice 12") else {
            panic!("expected a string object");
        };
        assert_eq!(decode_text_string(&plain), "Invoice 12");
    }
}
