// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Meeting note renderer: a structured Markdown file.

use chrono::{DateTime, FixedOffset};
use docforge_core::error::{DocforgeError, Result};
use docforge_core::types::{Artifact, Document, DocumentBody, DocumentKind, MeetingNoteBody};
use tracing::{debug, instrument};

use crate::render::{Renderer, wrong_body};

#[derive(Debug, Default, Clone, Copy)]
pub struct MeetingNoteRenderer;

impl Renderer for MeetingNoteRenderer {
    fn kinds(&self) -> &'static [DocumentKind] {
        &[DocumentKind::MeetingNote]
    }

    #[instrument(skip_all, fields(id = %document.id))]
    fn render(&self, document: &Document) -> Result<Artifact> {
        let DocumentBody::MeetingNote(note) = &document.body else {
            return Err(wrong_body(document, "meeting note"));
        };
        let text = render_note(document, note);
        debug!(bytes_len = text.len(), "meeting note rendered");
        Ok(Artifact::new(
            &document.id,
            DocumentKind::MeetingNote,
            text.into_bytes(),
        ))
    }
}

fn render_note(document: &Document, note: &MeetingNoteBody) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", single_line(&note.title)));
    out.push_str(&format!("**Author:** {}  \n", single_line(&document.author)));
    out.push_str(&format!("**Date:** {}  \n", document.timestamp.to_rfc3339()));
    if !note.attendees.is_empty() {
        let attendees: Vec<String> = note
            .attendees
            .iter()
            .map(String::as_str)
            .map(single_line)
            .collect();
        out.push_str(&format!("**Attendees:** {}  \n", attendees.join(", ")));
    }
    if let Some(location) = &note.location {
        out.push_str(&format!("**Location:** {}  \n", single_line(location)));
    }
    out.push_str("\n---\n");

    let content = note.content.trim();
    if !content.is_empty() {
        out.push('\n');
        out.push_str(content);
        out.push('\n');
    }

    if !note.discussion_points.is_empty() {
        out.push_str("\n## Discussion Points\n\n");
        for point in &note.discussion_points {
            out.push_str(&format!("- {}\n", single_line(point)));
        }
    }

    if !note.action_items.is_empty() {
        out.push_str("\n## Action Items\n\n");
        for item in &note.action_items {
            out.push_str(&format!("- [ ] {}", single_line(&item.task)));
            let owner = item.owner.as_deref().map(single_line);
            let due = item.due.as_deref().map(single_line);
            match (owner, due) {
                (Some(owner), Some(due)) => out.push_str(&format!(" ({owner}, due: {due})")),
                (Some(owner), None) => out.push_str(&format!(" ({owner})")),
                (None, Some(due)) => out.push_str(&format!(" (due: {due})")),
                (None, None) => {}
            }
            out.push('\n');
        }
    }

    out
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read back the title and `**Date:**` line of a rendered note.
pub fn read_title_and_date(markdown: &str) -> Result<(String, DateTime<FixedOffset>)> {
    let title = markdown
        .lines()
        .find_map(|l| l.strip_prefix("# "))
        .ok_or_else(|| DocforgeError::Parse("note has no title heading".into()))?;
    let date = markdown
        .lines()
        .find_map(|l| l.strip_prefix("**Date:** "))
        .ok_or_else(|| DocforgeError::Parse("note has no date line".into()))?;
    let timestamp = DateTime::parse_from_rfc3339(date.trim())
        .map_err(|e| DocforgeError::Parse(format!("bad note date {date:?}: {e}")))?;
    Ok((title.trim().to_string(), timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;
    use docforge_core::types::ActionItem;

    fn note() -> Document {
        fixtures::document(
            "doc_031",
            DocumentBody::MeetingNote(MeetingNoteBody {
                title: "Kickoff Mobilex".to_string(),
                attendees: vec!["Anna Kowalska".to_string(), "Piotr Nowak".to_string()],
                location: Some("Sala A".to_string()),
                content: "Omówiono harmonogram.".to_string(),
                discussion_points: vec!["Termin MVP".to_string()],
                action_items: vec![
                    ActionItem {
                        task: "Przygotować ofertę".to_string(),
                        owner: Some("Anna".to_string()),
                        due: Some("2023-06-30".to_string()),
                    },
                    ActionItem {
                        task: "Zamówić serwery".to_string(),
                        owner: None,
                        due: None,
                    },
                ],
            }),
        )
    }

    #[test]
    fn note_round_trips_title_and_date() {
        let artifact = MeetingNoteRenderer.render(&note()).unwrap();
        assert_eq!(artifact.file_name(), "doc_031.md");
        let text = String::from_utf8(artifact.bytes).unwrap();
        let (title, date) = read_title_and_date(&text).unwrap();
        assert_eq!(title, "Kickoff Mobilex");
        assert_eq!(date.to_rfc3339(), "2023-06-15T10:00:00+02:00");
    }

    #[test]
    fn note_lists_attendees_and_action_items() {
        let text = String::from_utf8(MeetingNoteRenderer.render(&note()).unwrap().bytes).unwrap();
        assert!(text.contains("**Attendees:** Anna Kowalska, Piotr Nowak"));
        assert!(text.contains("**Location:** Sala A"));
        assert!(text.contains("## Discussion Points\n\n- Termin MVP\n"));
        assert!(text.contains("- [ ] Przygotować ofertę (Anna, due: 2023-06-30)\n"));
        assert!(text.contains("- [ ] Zamówić serwery\n"));
    }

    #[test]
    fn title_newlines_do_not_break_heading() {
        let mut doc = note();
        if let DocumentBody::MeetingNote(n) = &mut doc.body {
            n.title = "Kickoff\nMobilex".to_string();
        }
        let text = String::from_utf8(MeetingNoteRenderer.render(&doc).unwrap().bytes).unwrap();
        assert!(text.starts_with("# Kickoff Mobilex\n"));
    }

    #[test]
    fn line_breaks_in_people_and_dates_stay_on_one_line() {
        let mut doc = note();
        if let DocumentBody::MeetingNote(n) = &mut doc.body {
            n.attendees = vec!["Anna\nKowalska".to_string(), "Piotr  Nowak\r\n".to_string()];
            n.action_items = vec![ActionItem {
                task: "Przygotować ofertę".to_string(),
                owner: Some("Anna\n## Injected".to_string()),
                due: Some("2023-06-30\n- [ ] fake".to_string()),
            }];
        }
        let text = String::from_utf8(MeetingNoteRenderer.render(&doc).unwrap().bytes).unwrap();
        assert!(text.contains("**Attendees:** Anna Kowalska, Piotr Nowak  \n"));
        assert!(text.contains("- [ ] Przygotować ofertę (Anna ## Injected, due: 2023-06-30 - [ ] fake)\n"));
        assert!(!text.lines().any(|line| line.starts_with("## Injected")));
        assert!(!text.lines().any(|line| line.starts_with("- [ ] fake")));
    }
}
