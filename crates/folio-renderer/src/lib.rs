//! Markdown rendering for folio documents.
//!
//! [`render_document`] turns a markdown body into HTML, a plain-text
//! rendition and a table of contents fragment. It is built from smaller
//! pieces that are also usable on their own:
//!
//! - [`MarkdownRenderer`]: event-driven renderer generic over a
//!   [`RenderBackend`], with [`HtmlBackend`] producing HTML5
//! - [`CodeBlockProcessor`]: hooks for fenced blocks with special meaning,
//!   such as [`MermaidProcessor`] and [`MathBlockProcessor`]
//! - [`render_toc`], [`place_toc`] and [`strip_leading_toc`] for the TOC fragment
//! - [`renumber`] for continuous ordered list numbering between headings
//! - [`plain_text`] for markup-free text
//!
//! # Example
//!
//! ```
//! use folio_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let result = MarkdownRenderer::<HtmlBackend>::new().render_markdown("# Hello\n\n**Bold** text");
//! assert_eq!(result.toc[0].title, "Hello");
//! assert!(result.html.contains("<strong>Bold</strong>"));
//! ```

mod abbr;
mod backend;
mod code_block;
mod document;
mod html;
mod renderer;
mod renumber;
mod state;
mod text;
mod toc;
mod util;

pub use abbr::Abbreviations;
pub use backend::{AlertKind, RenderBackend};
pub use code_block::{CodeBlockProcessor, MathBlockProcessor, MermaidProcessor, ProcessResult};
pub use document::{RenderedDocument, render_document};
pub use html::HtmlBackend;
pub use renderer::{EXTENSIONS_VERSION, MarkdownRenderer, RenderResult, extension_options};
pub use renumber::renumber;
pub use state::{TocEntry, escape_html, slugify};
pub use text::plain_text;
pub use toc::{place_toc, render_toc, strip_leading_toc};
