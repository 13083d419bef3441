//! Markdown content processing
//!
//! Plain-text summaries strip headings, HTML tags, emphasis, links and code.
//! Sections are split on ATX headings (`#` through `######`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Summary length used when relevant sections fall back to a summary
pub const DEFAULT_SUMMARY_LENGTH: usize = 500;

const CODE_BLOCK_PLACEHOLDER: &str = "[Code Block]";
const ELLIPSIS: &str = "...";

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}\s+").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static SECTION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(\S.*?)\s*$").unwrap());

/// A heading and the lines under it, up to the next heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    /// Number of leading `#` characters (1..=6)
    pub level: u8,
    pub body: String,
}

impl Section {
    /// Renders the section as a level-2 heading followed by its body as extracted,
    /// trailing newline included
    pub fn render(&self) -> String {
        format!("## {}\n{}", self.title, self.body)
    }
}

/// Strips markdown structure and truncates to `max_length` characters.
///
/// Truncation prefers the last `.` past the halfway mark; either way the
/// result ends with an ellipsis.
pub fn extract_summary(content: &str, max_length: usize) -> String {
    if content.is_empty() {
        return String::new();
    }

    let cleaned = FENCED_CODE.replace_all(content, CODE_BLOCK_PLACEHOLDER);
    let cleaned = HEADING_MARKER.replace_all(&cleaned, "");
    let cleaned = HTML_TAG.replace_all(&cleaned, "");
    let cleaned = BOLD.replace_all(&cleaned, "$1");
    let cleaned = ITALIC.replace_all(&cleaned, "$1");
    let cleaned = LINK.replace_all(&cleaned, "$1");
    let cleaned = INLINE_CODE.replace_all(&cleaned, "$1");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_length {
        return cleaned.to_string();
    }

    let cut = cleaned
        .char_indices()
        .nth(max_length)
        .map(|(index, _)| index)
        .unwrap_or(cleaned.len());
    let truncated = &cleaned[..cut];

    if let Some(period) = truncated.rfind('.') {
        let chars_before = truncated[..period].chars().count();

        if chars_before as f64 > max_length as f64 * 0.5 {
            return format!("{}{}", &truncated[..=period], ELLIPSIS);
        }
    }

    format!("{}{}", truncated, ELLIPSIS)
}

/// Splits content into sections. Anything before the first heading is dropped.
pub fn extract_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in content.lines() {
        if let Some(captures) = SECTION_HEADING.captures(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }

            current = Some(Section {
                title: captures[2].to_string(),
                level: captures[1].len() as u8,
                body: String::new(),
            });
        } else if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        }
    }

    sections.extend(current);
    sections
}

/// Renders a section as a level-2 heading followed by its trimmed body
fn render_section(section: &Section) -> String {
    format!("## {}\n{}", section.title, section.body.trim())
}

/// Returns the sections mentioning `query`, or a summary when none do
pub fn find_relevant_sections(content: &str, query: &str) -> String {
    if content.is_empty() || query.is_empty() {
        return String::new();
    }

    let relevant: Vec<String> = extract_sections(content)
        .iter()
        .filter(|section| {
            contains_search_term(&section.title, query) || contains_search_term(&section.body, query)
        })
        .map(render_section)
        .collect();

    if relevant.is_empty() {
        return extract_summary(content, DEFAULT_SUMMARY_LENGTH);
    }

    relevant.join("\n\n")
}

/// Case-insensitive containment. An empty text or term never matches.
pub fn contains_search_term(text: &str, term: &str) -> bool {
    if text.is_empty() || term.is_empty() {
        return false;
    }

    text.to_lowercase().contains(&term.to_lowercase())
}
