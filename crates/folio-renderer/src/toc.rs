//! Table of contents fragment.
//!
//! The fragment is a nested list of heading links wrapped in
//! `<div class="toc">`. Documents may request its position with a `[TOC]`
//! paragraph; otherwise it goes in front of the body.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::state::{TocEntry, escape_html};

static TOC_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\[TOC\]</p>\n?").unwrap());

static LEADING_TOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)^\s*<div\b[^>]*\bclass="[^"]*\btoc\b[^"]*"[^>]*>.*?</div>\s*"#).unwrap()
});

/// Render TOC entries as a nested list.
///
/// Returns an empty string when there are no entries.
#[must_use]
pub fn render_toc(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<div class="toc">"#);
    // Levels of the currently open lists, outermost first.
    let mut stack: Vec<u8> = Vec::new();

    for entry in entries {
        match stack.last().copied() {
            Some(top) if entry.level <= top => {
                out.push_str("</li>");
                while stack.len() > 1 && entry.level <= stack[stack.len() - 2] {
                    stack.pop();
                    out.push_str("</ul></li>");
                }
                if let Some(top) = stack.last_mut() {
                    *top = entry.level;
                }
            }
            _ => {
                out.push_str("<ul>");
                stack.push(entry.level);
            }
        }
        write!(
            out,
            r##"<li><a href="#{}">{}</a>"##,
            escape_html(&entry.id),
            escape_html(&entry.title)
        )
        .unwrap();
    }

    for _ in &stack {
        out.push_str("</li></ul>");
    }
    out.push_str("</div>");
    out
}

/// Put the TOC fragment into rendered HTML.
///
/// A `[TOC]` paragraph is replaced in place. Without one, a non-empty
/// fragment is prepended. Returns the HTML and whether a marker was found.
#[must_use]
pub fn place_toc(html: &str, toc_html: &str) -> (String, bool) {
    if TOC_MARKER_RE.is_match(html) {
        let placed = TOC_MARKER_RE.replace_all(html, NoExpand(toc_html));
        return (placed.into_owned(), true);
    }
    if toc_html.is_empty() {
        return (html.to_owned(), false);
    }
    (format!("{toc_html}{html}"), false)
}

/// Strip a TOC fragment sitting at the very start of `html`.
///
/// Chunked delivery uses this so the TOC is not shown twice.
#[must_use]
pub fn strip_leading_toc(html: &str) -> Cow<'_, str> {
    LEADING_TOC_RE.replace(html, "")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(level: u8, title: &str) -> TocEntry {
        TocEntry {
            level,
            title: title.to_owned(),
            id: title.to_lowercase(),
        }
    }

    #[test]
    fn test_render_toc_empty() {
        assert_eq!(render_toc(&[]), "");
    }

    #[test]
    fn test_render_toc_nested() {
        let toc = render_toc(&[entry(1, "A"), entry(2, "B"), entry(1, "C")]);
        assert_eq!(
            toc,
            concat!(
                r#"<div class="toc"><ul>"#,
                r##"<li><a href="#a">A</a><ul><li><a href="#b">B</a></li></ul></li>"##,
                r##"<li><a href="#c">C</a></li>"##,
                "</ul></div>"
            )
        );
    }

    #[test]
    fn test_render_toc_skipped_levels() {
        let toc = render_toc(&[entry(1, "A"), entry(3, "B"), entry(2, "C"), entry(1, "D")]);
        assert_eq!(
            toc,
            concat!(
                r##"<div class="toc"><ul><li><a href="#a">A</a>"##,
                r##"<ul><li><a href="#b">B</a></li><li><a href="#c">C</a></li></ul></li>"##,
                r##"<li><a href="#d">D</a></li></ul></div>"##
            )
        );
    }

    #[test]
    fn test_render_toc_starts_deep() {
        let toc = render_toc(&[entry(3, "A"), entry(1, "B")]);
        assert_eq!(
            toc,
            r##"<div class="toc"><ul><li><a href="#a">A</a></li><li><a href="#b">B</a></li></ul></div>"##
        );
    }

    #[test]
    fn test_render_toc_escapes_title() {
        let toc = render_toc(&[TocEntry {
            level: 2,
            title: "A & B".to_owned(),
            id: "a-b".to_owned(),
        }]);
        assert!(toc.contains(r##"<a href="#a-b">A &amp; B</a>"##));
    }

    #[test]
    fn test_place_toc_prepends() {
        let (html, placed) = place_toc("<p>Body</p>", "<div class=\"toc\"></div>");
        assert!(!placed);
        assert_eq!(html, "<div class=\"toc\"></div><p>Body</p>");
    }

    #[test]
    fn test_place_toc_replaces_marker() {
        let (html, placed) = place_toc("<h1 id=\"a\">A</h1><p>[TOC]</p><p>Body</p>", "TOC$1");
        assert!(placed);
        assert_eq!(html, "<h1 id=\"a\">A</h1>TOC$1<p>Body</p>");
    }

    #[test]
    fn test_place_toc_without_headings() {
        let (html, placed) = place_toc("<p>Body</p>", "");
        assert!(!placed);
        assert_eq!(html, "<p>Body</p>");

        let (html, placed) = place_toc("<p>[TOC]</p><p>Body</p>", "");
        assert!(placed);
        assert_eq!(html, "<p>Body</p>");
    }

    #[test]
    fn test_strip_leading_toc() {
        let html = r##"<div class="toc"><ul><li><a href="#a">A</a></li></ul></div><h1 id="a">A</h1>"##;
        assert_eq!(strip_leading_toc(html), r#"<h1 id="a">A</h1>"#);
    }

    #[test]
    fn test_strip_leading_toc_only_at_start() {
        let html = r#"<p>Intro</p><div class="toc"><ul></ul></div>"#;
        assert_eq!(strip_leading_toc(html), html);

        let html = r#"<div class="note">Not a toc</div>"#;
        assert_eq!(strip_leading_toc(html), html);
    }
}
