// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RFC 5322 message renderer (`.eml`) and a small header reader used to
// verify rendered messages.
//
// Header values are written as raw UTF-8 (RFC 6532) with an 8bit body.
// Lines end in CRLF and address lists are folded at 78 columns.

use chrono::{DateTime, FixedOffset};
use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{Artifact, Document, DocumentBody, DocumentKind, EmailBody, Person};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::render::{Renderer, wrong_body};

const CRLF: &str = "\r\n";
const FOLD_WIDTH: usize = 78;
const MESSAGE_ID_DOMAIN: &str = "docforge.invalid";

#[derive(Debug, Default, Clone, Copy)]
pub struct EmailRenderer;

impl Renderer for EmailRenderer {
    fn kinds(&self) -> &'static [DocumentKind] {
        &[DocumentKind::Email]
    }

    #[instrument(skip_all, fields(id = %document.id))]
    fn render(&self, document: &Document) -> Result<Artifact> {
        let DocumentBody::Email(email) = &document.body else {
            return Err(wrong_body(document, "email"));
        };
        let bytes = render_message(document, email)?;
        debug!(bytes_len = bytes.len(), "message rendered");
        Ok(Artifact::new(&document.id, DocumentKind::Email, bytes))
    }
}

fn render_message(document: &Document, email: &EmailBody) -> Result<Vec<u8>> {
    if email.recipients.is_empty() {
        return Err(DocforgeError::render(&document.id, "email has no recipients"));
    }
    if email.from.email.trim().is_empty() {
        return Err(DocforgeError::render(&document.id, "email has no sender address"));
    }

    let mut out = String::new();
    push_header(&mut out, "From", &sanitize(&email.from.mailbox()));
    push_address_header(&mut out, "To", &email.recipients);
    if !email.cc.is_empty() {
        push_address_header(&mut out, "Cc", &email.cc);
    }
    push_header(&mut out, "Date", &document.timestamp.to_rfc2822());
    push_header(&mut out, "Subject", &sanitize(&email.subject));
    push_header(&mut out, "Message-ID", &message_id(document));
    push_header(&mut out, "MIME-Version", "1.0");
    push_header(&mut out, "Content-Type", "text/plain; charset=utf-8");
    push_header(&mut out, "Content-Transfer-Encoding", "8bit");
    out.push_str(CRLF);

    let body = email.body.replace("\r\n", "\n");
    for line in body.lines() {
        out.push_str(line);
        out.push_str(CRLF);
    }

    Ok(out.into_bytes())
}

/// Header values may not carry line breaks of their own.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str(CRLF);
}

/// Write an address list, folding after a comma whenever the next mailbox
/// would push the line past the fold width.
fn push_address_header(out: &mut String, name: &str, people: &[Person]) {
    let mut line_len = name.len() + 2;
    out.push_str(name);
    out.push_str(": ");
    for (i, person) in people.iter().enumerate() {
        let mailbox = sanitize(&person.mailbox());
        let mailbox_len = mailbox.chars().count();
        if i > 0 {
            out.push(',');
            line_len += 1;
            if line_len + 1 + mailbox_len > FOLD_WIDTH {
                out.push_str(CRLF);
                out.push(' ');
                line_len = 1;
            } else {
                out.push(' ');
                line_len += 1;
            }
        }
        out.push_str(&mailbox);
        line_len += mailbox_len;
    }
    out.push_str(CRLF);
}

/// Stable message identifier derived from the document id and timestamp.
fn message_id(document: &Document) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.id.as_bytes());
    hasher.update(document.timestamp.to_rfc3339().as_bytes());
    let digest = hasher.finalize();
    format!(
        "<{}.{}@{MESSAGE_ID_DOMAIN}>",
        document.id,
        hex::encode(&digest[..6])
    )
}

// -- Inspection -------------------------------------------------------------

/// Parse the header block of a message, unfolding continuation lines.
pub fn parse_headers(message: &[u8]) -> Result<Vec<(String, String)>> {
    let text = std::str::from_utf8(message)
        .map_err(|e| DocforgeError::Parse(format!("message is not UTF-8: {e}")))?;

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in text.split("\r\n") {
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            let (_, value) = headers.last_mut().ok_or_else(|| {
                DocforgeError::Parse("continuation line before first header".into())
            })?;
            value.push(' ');
            value.push_str(line.trim_start());
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| DocforgeError::Parse(format!("malformed header line {line:?}")))?;
        headers.push((name.to_string(), value.trim().to_string()));
    }
    Ok(headers)
}

/// First value of the named header (case-insensitive).
pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Parse an RFC 2822 `Date` header value, keeping its offset.
pub fn parse_date(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(value)
        .map_err(|e| DocforgeError::Parse(format!("bad Date header {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;

    #[test]
    fn date_header_keeps_offset() {
        let doc = fixtures::email("doc_007");
        let artifact = EmailRenderer.render(&doc).unwrap();
        let headers = parse_headers(&artifact.bytes).unwrap();

        let date = parse_date(header(&headers, "Date").unwrap()).unwrap();
        assert_eq!(date.to_rfc3339(), "2023-06-15T10:00:00+02:00");
        assert_eq!(header(&headers, "Subject"), Some("Budżet Q3"));
        assert_eq!(
            header(&headers, "From"),
            Some("Anna Kowalska <anna.kowalska@example.pl>")
        );
    }

    #[test]
    fn uses_crlf_and_blank_line_before_body() {
        let artifact = EmailRenderer.render(&fixtures::email("doc_007")).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("\r\n\r\nCześć Piotr,\r\nw załączniku budżet.\r\n"));
        assert!(!text.replace("\r\n", "").contains('\n'));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
    }

    #[test]
    fn message_id_is_stable() {
        let doc = fixtures::email("doc_007");
        let first = EmailRenderer.render(&doc).unwrap();
        let second = EmailRenderer.render(&doc).unwrap();
        assert_eq!(first.bytes, second.bytes);

        let headers = parse_headers(&first.bytes).unwrap();
        let id = header(&headers, "Message-ID").unwrap();
        assert!(id.starts_with("<doc_007."));
        assert!(id.ends_with("@docforge.invalid>"));
    }

    #[test]
    fn long_recipient_lists_fold() {
        let mut doc = fixtures::email("doc_008");
        if let DocumentBody::Email(email) = &mut doc.body {
            email.recipients = (0..6)
                .map(|i| Person {
                    name: format!("Recipient Number {i}"),
                    email: format!("recipient.number{i}@example.pl"),
                })
                .collect();
            email.cc = vec![Person {
                name: String::new(),
                email: "biuro@example.pl".to_string(),
            }];
        }
        let artifact = EmailRenderer.render(&doc).unwrap();
        let text = String::from_utf8(artifact.bytes.clone()).unwrap();
        let header_block = text.split("\r\n\r\n").next().unwrap();
        assert!(header_block.split("\r\n").all(|l| l.chars().count() <= FOLD_WIDTH));

        let headers = parse_headers(&artifact.bytes).unwrap();
        let to = header(&headers, "To").unwrap();
        assert_eq!(to.matches('@').count(), 6);
        assert_eq!(header(&headers, "Cc"), Some("biuro@example.pl"));
    }

    #[test]
    fn header_injection_is_neutralised() {
        let mut doc = fixtures::email("doc_009");
        if let DocumentBody::Email(email) = &mut doc.body {
            email.subject = "Hello\r\nBcc: attacker@example.com".to_string();
        }
        let artifact = EmailRenderer.render(&doc).unwrap();
        let headers = parse_headers(&artifact.bytes).unwrap();
        assert!(header(&headers, "Bcc").is_none());
        assert!(header(&headers, "Subject").unwrap().contains("Bcc"));
    }

    #[test]
    fn wrong_body_is_a_render_error() {
        let doc = fixtures::report("doc_010");
        let err = EmailRenderer.render(&doc).unwrap_err();
        assert_eq!(err.class(), docforge_core::ErrorClass::Render);
    }
}
