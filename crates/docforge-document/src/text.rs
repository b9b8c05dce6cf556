// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text helpers shared by the renderers: paragraph and heading
// splitting and word wrapping.

use docforge_core::types::Section;

/// Split text into paragraphs on blank lines. Single newlines stay inside
/// the paragraph.
pub fn paragraphs(text: &str) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n");
    normalised
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split free text on Markdown-style headings (`#`, `##`, `###`).
///
/// Text before the first heading becomes a section with an empty heading.
pub fn split_markdown_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading = String::new();
    let mut body: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(title) = heading_text(line) {
            flush(&heading, &body, &mut sections);
            heading = title.to_string();
            body.clear();
        } else {
            body.push(line);
        }
    }
    flush(&heading, &body, &mut sections);
    sections
}

fn flush(heading: &str, body: &[&str], sections: &mut Vec<Section>) {
    let text = body.join("\n").trim().to_string();
    if !heading.is_empty() || !text.is_empty() {
        sections.push(Section {
            heading: heading.to_string(),
            content: text,
            table: None,
        });
    }
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then_some(title)
}

// -- Wrapping ---------------------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_width` are force-broken on character boundaries.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.lines() {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    if chunks.peek().is_some() {
                        result.push(chunk.iter().collect());
                    } else {
                        current = chunk.iter().collect();
                        current_len = chunk.len();
                    }
                }
            } else if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
                current_len = word_len;
            }
        }

        if !current.is_empty() {
            result.push(current);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let parts = paragraphs("First line\nstill first\n\n\nSecond\r\n\r\nThird ");
        assert_eq!(parts, vec!["First line\nstill first", "Second", "Third"]);
    }

    #[test]
    fn markdown_sections_keep_preamble() {
        let sections = split_markdown_sections(
            "Intro text\n\n## Budget\nNet 25 500 PLN\n\n## Risks\n- late delivery\n#hashtag stays",
        );
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].content, "Intro text");
        assert_eq!(sections[1].heading, "Budget");
        assert_eq!(sections[2].heading, "Risks");
        assert!(sections[2].content.contains("#hashtag stays"));
    }

    #[test]
    fn text_without_headings_is_one_section() {
        let sections = split_markdown_sections("Just a paragraph.");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].heading.is_empty());
    }

    #[test]
    fn wrap_respects_width_and_utf8() {
        let lines = wrap_text("Zażółć gęślą jaźń to polskie zdanie testowe", 12);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
        assert_eq!(lines.join(" "), "Zażółć gęślą jaźń to polskie zdanie testowe");
    }

    #[test]
    fn wrap_force_breaks_long_words() {
        let lines = wrap_text("ąąąąąąąąąą end", 4);
        assert_eq!(lines, vec!["ąąąą", "ąąąą", "ąą", "end"]);
    }

    #[test]
    fn wrap_keeps_blank_lines() {
        let lines = wrap_text("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }
}
