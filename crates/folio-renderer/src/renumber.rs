//! Ordered list renumbering.
//!
//! Markdown restarts an ordered list whenever a paragraph or code block
//! interrupts it. This pass numbers the items of top-level ordered lists
//! continuously between headings and records the number in a
//! `data-ol-index` attribute, leaving the visible markup alone. The
//! footnote list appended after the body is not touched.
//!
//! The scan is tag-based, not a full HTML parser. It relies on the input
//! being renderer output and falls back to the unmodified HTML as soon as
//! the list structure stops making sense.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

static LIST_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)(h[1-6]|ol|ul|li)\b[^>]*>").unwrap());

static START_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bstart\s*=\s*"?(-?\d+)"?"#).unwrap());

const INDEX_ATTR: &str = "data-ol-index";

/// Opening of the footnote block the renderer appends after the body.
const FOOTNOTES_START: &str = r#"<div class="footnote">"#;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Open {
    Ordered,
    Unordered,
    Item,
}

/// Renumber top-level ordered list items per heading segment.
///
/// Returns the input unchanged when the tag structure is unbalanced.
#[must_use]
pub fn renumber(html: &str) -> String {
    let (body, footnotes) = html.split_at(html.find(FOOTNOTES_START).unwrap_or(html.len()));
    match try_renumber(body) {
        Some(mut renumbered) => {
            renumbered.push_str(footnotes);
            renumbered
        }
        None => {
            tracing::debug!("List structure not balanced, skipping renumbering");
            html.to_owned()
        }
    }
}

fn try_renumber(html: &str) -> Option<String> {
    let mut out = String::with_capacity(html.len() + 64);
    let mut stack: Vec<Open> = Vec::new();
    let mut counter: i64 = 0;
    let mut last = 0;

    for caps in LIST_TAG_RE.captures_iter(html) {
        let tag = caps.get(0)?;
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();

        out.push_str(&html[last..tag.start()]);
        last = tag.end();

        match (name.as_str(), closing) {
            (heading, false) if heading.starts_with('h') => counter = 0,
            (_, true) if name.starts_with('h') => {}
            ("ol", false) => {
                if !stack.contains(&Open::Ordered) {
                    if let Some(start) = START_ATTR_RE
                        .captures(tag.as_str())
                        .and_then(|c| c[1].parse::<i64>().ok())
                    {
                        counter = start - 1;
                    }
                }
                stack.push(Open::Ordered);
            }
            ("ul", false) => stack.push(Open::Unordered),
            ("li", false) => {
                let top_level = stack.last() == Some(&Open::Ordered)
                    && stack.iter().filter(|open| **open == Open::Ordered).count() == 1;
                if top_level {
                    counter += 1;
                    if !tag.as_str().contains(INDEX_ATTR) {
                        let (open, rest) = tag.as_str().split_at(3);
                        out.push_str(open);
                        write!(out, r#" {INDEX_ATTR}="{counter}""#).unwrap();
                        out.push_str(rest);
                        stack.push(Open::Item);
                        continue;
                    }
                }
                stack.push(Open::Item);
            }
            ("ol", true) => pop(&mut stack, Open::Ordered)?,
            ("ul", true) => pop(&mut stack, Open::Unordered)?,
            ("li", true) => pop(&mut stack, Open::Item)?,
            _ => {}
        }
        out.push_str(tag.as_str());
    }

    if !stack.is_empty() {
        return None;
    }
    out.push_str(&html[last..]);
    Some(out)
}

fn pop(stack: &mut Vec<Open>, expected: Open) -> Option<()> {
    (stack.pop()? == expected).then_some(())
}
