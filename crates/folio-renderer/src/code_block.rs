//! Code block processors for fenced blocks with special meaning.
//!
//! Processors are registered with the renderer and checked in order when a
//! fenced block is encountered. The first processor returning
//! [`ProcessResult::Inline`] wins; otherwise the block renders as code.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use folio_renderer::{CodeBlockProcessor, ProcessResult};
//!
//! struct ShoutProcessor;
//!
//! impl CodeBlockProcessor for ShoutProcessor {
//!     fn process(
//!         &mut self,
//!         language: &str,
//!         _attrs: &HashMap<String, String>,
//!         source: &str,
//!     ) -> ProcessResult {
//!         if language == "shout" {
//!             ProcessResult::Inline(format!("<p>{}</p>", source.to_uppercase()))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt::Write;

use crate::state::escape_html;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the code block with this HTML.
    Inline(String),
    /// Not handled here; render as a regular code block.
    PassThrough,
}

/// Trait for processing special code blocks.
pub trait CodeBlockProcessor {
    /// Process a code block.
    ///
    /// * `language` - Language identifier from the fence info string
    /// * `attrs` - `key=value` pairs following the language
    /// * `source` - Raw content of the block
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
    ) -> ProcessResult;
}

/// Renders ```` ```mermaid ```` fences as `<div class="mermaid">` for client-side rendering.
pub struct MermaidProcessor;

impl CodeBlockProcessor for MermaidProcessor {
    fn process(
        &mut self,
        language: &str,
        _attrs: &HashMap<String, String>,
        source: &str,
    ) -> ProcessResult {
        if !language.eq_ignore_ascii_case("mermaid") {
            return ProcessResult::PassThrough;
        }
        let mut html = String::with_capacity(source.len() + 32);
        write!(
            html,
            r#"<div class="mermaid">{}</div>"#,
            escape_html(source.trim_end())
        )
        .unwrap();
        ProcessResult::Inline(html)
    }
}

/// Renders ```` ```math ```` fences as display math.
pub struct MathBlockProcessor;

impl CodeBlockProcessor for MathBlockProcessor {
    fn process(
        &mut self,
        language: &str,
        _attrs: &HashMap<String, String>,
        source: &str,
    ) -> ProcessResult {
        if !matches!(language, "math" | "latex" | "tex") {
            return ProcessResult::PassThrough;
        }
        ProcessResult::Inline(format!(
            r#"<div class="arithmatex">\[{}\]</div>"#,
            escape_html(source.trim())
        ))
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value ...]`
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let attrs = parts
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| {
            let value = value.trim_matches('"').trim_matches('\'');
            (key.to_owned(), value.to_owned())
        })
        .collect();

    (language, attrs)
}
