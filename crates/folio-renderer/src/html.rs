//! HTML backend for markdown rendering.
//!
//! Produces HTML5 in the shape front ends built for Python-Markdown expect:
//! admonition boxes for alerts and `arithmatex` wrappers for KaTeX.

use std::fmt::Write;

use crate::backend::{AlertKind, RenderBackend};
use crate::state::escape_html;

/// HTML render backend.
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn alert_start(kind: AlertKind, out: &mut String) {
        write!(
            out,
            r#"<div class="admonition {}"><p class="admonition-title">{}</p>"#,
            kind.as_str(),
            kind.title()
        )
        .unwrap();
    }

    fn alert_end(_kind: AlertKind, out: &mut String) {
        out.push_str("</div>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        write!(out, r#"<img src="{}" alt="{}""#, escape_html(src), escape_html(alt)).unwrap();
        if !title.is_empty() {
            write!(out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        out.push('>');
    }

    fn inline_math(source: &str, out: &mut String) {
        write!(
            out,
            r#"<span class="arithmatex">\({}\)</span>"#,
            escape_html(source)
        )
        .unwrap();
    }

    fn display_math(source: &str, out: &mut String) {
        write!(
            out,
            r#"<span class="arithmatex">\[{}\]</span>"#,
            escape_html(source.trim())
        )
        .unwrap();
    }
}
