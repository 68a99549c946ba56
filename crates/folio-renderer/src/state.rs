//! Per-render state tracked while walking markdown events.
//!
//! Every [`MarkdownRenderer`](crate::MarkdownRenderer) owns fresh instances,
//! so nothing here survives from one document to the next.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::Alignment;

/// State for tracking code block rendering.
#[derive(Default)]
pub struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Inline style for the current cell's column alignment.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    /// End image capture and return the alt text.
    pub fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// A heading ready to be written out.
pub struct CompletedHeading {
    pub level: u8,
    pub id: String,
    pub classes: Vec<String>,
    pub html: String,
}

/// Collects heading text and assigns unique anchor ids.
#[derive(Default)]
pub struct HeadingState {
    current_level: Option<u8>,
    explicit_id: Option<String>,
    classes: Vec<String>,
    /// Plain text for the TOC and slug.
    text: String,
    /// Inline HTML for the heading body.
    html: String,
    toc: Vec<TocEntry>,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    /// Start a heading. `id` and `classes` come from `{#id .class}` attributes.
    pub fn start_heading(&mut self, level: u8, id: Option<String>, classes: Vec<String>) {
        self.current_level = Some(level);
        self.explicit_id = id;
        self.classes = classes;
        self.text.clear();
        self.html.clear();
    }

    /// Finish the current heading and record its TOC entry.
    pub fn complete_heading(&mut self) -> Option<CompletedHeading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);

        let id = match self.explicit_id.take() {
            Some(id) => {
                *self.id_counts.entry(id.clone()).or_default() += 1;
                id
            }
            None => self.generate_id(&text),
        };

        self.toc.push(TocEntry {
            level,
            title: text.trim().to_owned(),
            id: id.clone(),
        });

        Some(CompletedHeading {
            level,
            id,
            classes: std::mem::take(&mut self.classes),
            html,
        })
    }

    /// Generate a unique ID for a heading (`faq`, `faq-1`, `faq-2`, ...).
    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id.push_str("section");
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub fn html_buffer(&mut self) -> &mut String {
        &mut self.html
    }

    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Collects footnote definitions so they can be emitted after the body.
#[derive(Default)]
pub struct FootnoteState {
    numbers: HashMap<String, usize>,
    /// (number, label, rendered body) in definition order.
    definitions: Vec<(usize, String, String)>,
    /// Label and the body output saved while a definition is being rendered.
    open: Option<(String, String)>,
}

impl FootnoteState {
    /// Number for a label, assigned on first sight.
    pub fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_owned()).or_insert(next)
    }

    /// Redirect `output` into a fresh buffer for the definition body.
    pub fn start_definition(&mut self, label: &str, output: &mut String) {
        self.number(label);
        let saved = std::mem::take(output);
        self.open = Some((label.to_owned(), saved));
    }

    /// Restore the body output and keep the definition for later.
    pub fn end_definition(&mut self, output: &mut String) {
        if let Some((label, saved)) = self.open.take() {
            let body = std::mem::replace(output, saved);
            let number = self.number(&label);
            self.definitions.push((number, label, body));
        }
    }

    /// Append the collected footnotes as a numbered list.
    pub fn render(&mut self, out: &mut String) {
        if self.definitions.is_empty() {
            return;
        }
        let mut definitions = std::mem::take(&mut self.definitions);
        definitions.sort_by_key(|(number, _, _)| *number);

        out.push_str(r#"<div class="footnote"><hr><ol>"#);
        for (number, label, mut body) in definitions {
            let label = escape_html(&label);
            let backref = format!(
                r##"&#160;<a class="footnote-backref" href="#fnref:{label}" title="Jump back to footnote {number} in the text">&#8617;</a>"##
            );
            match body.strip_suffix("</p>") {
                Some(stripped) => {
                    body.truncate(stripped.len());
                    body.push_str(&backref);
                    body.push_str("</p>");
                }
                None => body.push_str(&backref),
            }
            write!(out, r#"<li id="fn:{label}">{body}</li>"#).unwrap();
        }
        out.push_str("</ol></div>");
    }
}

/// Convert text to a URL-safe slug.
///
/// Lowercases, keeps Unicode letters and digits, collapses whitespace,
/// dashes and underscores into single dashes, and drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("Über Café"), "über-café");
        assert_eq!(slugify("安装指南"), "安装指南");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_table_alignment_styles() {
        let mut state = TableState::default();
        state.start(vec![Alignment::Left, Alignment::None, Alignment::Right]);
        state.start_head();

        assert_eq!(state.current_alignment_style(), r#" style="text-align:left""#);
        state.next_cell();
        assert_eq!(state.current_alignment_style(), "");
        state.next_cell();
        assert_eq!(state.current_alignment_style(), r#" style="text-align:right""#);
        state.next_cell();
        assert_eq!(state.current_alignment_style(), "");
    }

    #[test]
    fn test_heading_ids_are_deduplicated() {
        let mut state = HeadingState::default();

        for _ in 0..3 {
            state.start_heading(2, None, Vec::new());
            state.push_text("FAQ");
            state.complete_heading();
        }

        let ids: Vec<_> = state.take_toc().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["faq", "faq-1", "faq-2"]);
    }

    #[test]
    fn test_heading_explicit_id_reserves_slug() {
        let mut state = HeadingState::default();

        state.start_heading(2, Some("setup".to_owned()), vec!["wide".to_owned()]);
        state.push_text("Install");
        let heading = state.complete_heading().unwrap();
        assert_eq!(heading.id, "setup");
        assert_eq!(heading.classes, vec!["wide"]);

        state.start_heading(2, None, Vec::new());
        state.push_text("Setup");
        assert_eq!(state.complete_heading().unwrap().id, "setup-1");
    }

    #[test]
    fn test_heading_without_slug_text() {
        let mut state = HeadingState::default();
        state.start_heading(1, None, Vec::new());
        state.push_text("???");

        assert_eq!(state.complete_heading().unwrap().id, "section");
    }

    #[test]
    fn test_footnotes_render_in_number_order() {
        let mut state = FootnoteState::default();
        assert_eq!(state.number("b"), 1);
        assert_eq!(state.number("a"), 2);
        assert_eq!(state.number("b"), 1);

        let mut output = String::from("<p>body</p>");
        state.start_definition("a", &mut output);
        output.push_str("<p>Alpha</p>");
        state.end_definition(&mut output);
        state.start_definition("b", &mut output);
        output.push_str("<p>Beta</p>");
        state.end_definition(&mut output);
        assert_eq!(output, "<p>body</p>");

        let mut out = String::new();
        state.render(&mut out);
        let beta = out.find("Beta").unwrap();
        let alpha = out.find("Alpha").unwrap();
        assert!(beta < alpha);
        assert!(out.contains(
            r##"<li id="fn:b"><p>Beta&#160;<a class="footnote-backref" href="#fnref:b""##
        ));
    }
}
