//! Plain text extraction from rendered HTML.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>|<[^>]+>").unwrap());

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Elements whose boundaries separate words.
const BLOCK_TAGS: &[&str] = &[
    "address", "blockquote", "br", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "li", "ol", "p", "pre", "table", "td", "th", "tr", "ul",
];

/// Strip markup from `html` and decode entities.
///
/// Block boundaries become line breaks so adjacent paragraphs do not run
/// together. The result is meant for search and summaries, not display.
#[must_use]
pub fn plain_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, |caps: &Captures<'_>| {
        let is_block = caps
            .get(2)
            .is_some_and(|name| BLOCK_TAGS.contains(&name.as_str().to_ascii_lowercase().as_str()));
        if is_block { "\n" } else { "" }
    });
    let decoded = html_escape::decode_html_entities(&stripped);
    BLANK_LINES_RE.replace_all(decoded.trim(), "\n").into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_plain_text_strips_tags() {
        assert_eq!(
            plain_text("<h1 id=\"t\">Title</h1><p>Hello <strong>world</strong>.</p>"),
            "Title\nHello world."
        );
    }

    #[test]
    fn test_plain_text_decodes_entities() {
        assert_eq!(plain_text("<p>a &amp; b &lt;c&gt; &#8617;</p>"), "a & b <c> \u{21a9}");
    }

    #[test]
    fn test_plain_text_list_items() {
        assert_eq!(plain_text("<ul><li>one</li><li>two</li></ul>"), "one\ntwo");
    }

    #[test]
    fn test_plain_text_empty() {
        assert_eq!(plain_text(""), "");
        assert_eq!(plain_text("<hr>"), "");
    }

    #[test]
    fn test_plain_text_comment() {
        assert_eq!(plain_text("<!-- note --><p>x</p>"), "x");
    }
}
