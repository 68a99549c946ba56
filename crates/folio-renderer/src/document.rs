//! Whole-document rendering pipeline.

use crate::abbr::Abbreviations;
use crate::code_block::{MathBlockProcessor, MermaidProcessor};
use crate::html::HtmlBackend;
use crate::renderer::MarkdownRenderer;
use crate::renumber::renumber;
use crate::state::TocEntry;
use crate::text::plain_text;
use crate::toc::{place_toc, render_toc};

/// A document body rendered to HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    /// Full HTML, TOC included (in front unless the body placed it).
    pub html: String,
    /// Markup-free text of the body, for search and summaries.
    pub plain_text: String,
    /// TOC fragment, empty when the document has no headings.
    pub toc_html: String,
    /// Headings in document order.
    pub toc: Vec<TocEntry>,
}

/// Render a markdown body with the fixed extension set.
///
/// Each call starts from fresh renderer state, so heading ids and footnote
/// numbers never carry over between documents. Rendering never fails;
/// syntax that is not understood comes through as text.
///
/// # Example
///
/// ```
/// use folio_renderer::render_document;
///
/// let doc = render_document("# Hello\n\n1. one\n2. two");
/// assert!(doc.html.starts_with(r#"<div class="toc">"#));
/// assert!(doc.html.contains(r#"<li data-ol-index="2">two</li>"#));
/// assert_eq!(doc.plain_text, "Hello\none\ntwo");
/// ```
#[must_use]
pub fn render_document(markdown: &str) -> RenderedDocument {
    let (body, abbreviations) = Abbreviations::extract(markdown);

    let result = MarkdownRenderer::<HtmlBackend>::new()
        .with_processor(MermaidProcessor)
        .with_processor(MathBlockProcessor)
        .render_markdown(&body);

    let html = abbreviations.apply(&result.html);
    let toc_html = render_toc(&result.toc);
    let (html, placed) = place_toc(&html, &toc_html);

    // Text comes from the body alone; a prepended TOC would repeat every heading.
    let plain_text = if placed || toc_html.is_empty() {
        plain_text(&html)
    } else {
        plain_text(&html[toc_html.len()..])
    };

    RenderedDocument {
        html: renumber(&html),
        plain_text,
        toc_html,
        toc: result.toc,
    }
}
