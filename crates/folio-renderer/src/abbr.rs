//! Abbreviations (`*[HTML]: Hyper Text Markup Language`).
//!
//! Definitions are pulled out of the markdown before parsing, then every
//! whole-word occurrence in the rendered text is wrapped in `<abbr>`.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::state::escape_html;
use crate::util::fenced_code_ranges;

static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}\*\[([^\]]+)\]:[ \t]*(.*?)\s*$").unwrap());

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)?[^>]*>").unwrap());

/// Elements whose text is never annotated.
const SKIPPED_ELEMENTS: &[&str] = &["code", "pre", "abbr", "script", "style"];

/// Abbreviation definitions collected from a document.
#[derive(Debug, Default)]
pub struct Abbreviations {
    /// (escaped abbreviation, escaped title), longest abbreviation first.
    entries: Vec<(String, String)>,
    pattern: Option<Regex>,
}

impl Abbreviations {
    /// Remove definition lines from `markdown` and collect them.
    ///
    /// Lines inside fenced code are left alone. A later definition of the
    /// same abbreviation replaces an earlier one.
    pub fn extract(markdown: &str) -> (String, Self) {
        let code = fenced_code_ranges(markdown);
        let mut body = String::with_capacity(markdown.len());
        let mut definitions: Vec<(String, String)> = Vec::new();
        let mut offset = 0;

        for line in markdown.split_inclusive('\n') {
            let in_code = code.iter().any(|range| range.contains(&offset));
            offset += line.len();

            let definition = if in_code {
                None
            } else {
                DEFINITION_RE.captures(line.trim_end_matches(['\r', '\n']))
            };
            match definition {
                Some(caps) => {
                    let abbr = caps[1].trim().to_owned();
                    let title = caps[2].trim_matches(['"', '\'']).to_owned();
                    definitions.retain(|(existing, _)| *existing != abbr);
                    if !abbr.is_empty() && !title.is_empty() {
                        definitions.push((abbr, title));
                    }
                }
                None => body.push_str(line),
            }
        }

        (body, Self::new(definitions))
    }

    fn new(definitions: Vec<(String, String)>) -> Self {
        let mut entries: Vec<(String, String)> = definitions
            .into_iter()
            .map(|(abbr, title)| (escape_html(&abbr), escape_html(&title)))
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let pattern = if entries.is_empty() {
            None
        } else {
            let alternation = entries
                .iter()
                .map(|(abbr, _)| regex::escape(abbr))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&alternation).ok()
        };

        Self { entries, pattern }
    }

    /// Wrap abbreviation occurrences in the text parts of `html`.
    #[must_use]
    pub fn apply(&self, html: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return html.to_owned();
        };

        let mut out = String::with_capacity(html.len());
        let mut skip_depth = 0usize;
        let mut last = 0;

        for caps in TAG_RE.captures_iter(html) {
            let Some(tag) = caps.get(0) else { continue };
            let text = &html[last..tag.start()];
            if skip_depth == 0 {
                self.wrap_text(pattern, text, &mut out);
            } else {
                out.push_str(text);
            }
            out.push_str(tag.as_str());
            last = tag.end();

            let name = caps
                .get(2)
                .map(|m| m.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            if SKIPPED_ELEMENTS.contains(&name.as_str()) {
                if caps[1].is_empty() {
                    skip_depth += 1;
                } else {
                    skip_depth = skip_depth.saturating_sub(1);
                }
            }
        }

        let rest = &html[last..];
        if skip_depth == 0 {
            self.wrap_text(pattern, rest, &mut out);
        } else {
            out.push_str(rest);
        }
        out
    }

    fn wrap_text(&self, pattern: &Regex, text: &str, out: &mut String) {
        let mut last = 0;
        for found in pattern.find_iter(text) {
            let before = text[..found.start()].chars().next_back();
            let after = text[found.end()..].chars().next();
            if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
                continue;
            }
            let Some((abbr, title)) = self.entries.iter().find(|(abbr, _)| abbr == found.as_str())
            else {
                continue;
            };
            out.push_str(&text[last..found.start()]);
            write!(out, r#"<abbr title="{title}">{abbr}</abbr>"#).unwrap();
            last = found.end();
        }
        out.push_str(&text[last..]);
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
