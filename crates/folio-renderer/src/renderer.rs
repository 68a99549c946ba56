//! Generic markdown renderer with pluggable backend.

use std::collections::HashMap;
use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::backend::{AlertKind, RenderBackend};
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::state::{
    CodeBlockState, FootnoteState, HeadingState, ImageState, TableState, TocEntry, escape_html,
};
use crate::util::heading_level_to_num;

/// Version of the enabled syntax extension set.
///
/// Bumped whenever [`extension_options`] or the markup of an extension
/// changes, so callers can invalidate anything derived from rendered HTML.
pub const EXTENSIONS_VERSION: u32 = 1;

/// Parser options for the fixed extension set.
#[must_use]
pub fn extension_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_MATH
        | Options::ENABLE_GFM
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_SUPERSCRIPT
        | Options::ENABLE_SUBSCRIPT
}

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML content.
    pub html: String,
    /// Headings in document order.
    pub toc: Vec<TocEntry>,
}

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait to delegate leaf markup while handling
/// document structure (tables, lists, headings, footnotes) generically.
/// A renderer is meant to be used for a single document: construct a new one
/// per call so heading ids and footnote numbers start from scratch.
///
/// # Code Block Processors
///
/// Custom code block processing can be added via [`with_processor`](Self::with_processor).
/// Processors are checked in order; the first returning [`ProcessResult::Inline`] wins.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    footnotes: FootnoteState,
    pending_image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    pending_attrs: HashMap<String, String>,
    /// Stack of alert kinds for nested blockquotes (regular blockquote uses None).
    alert_stack: Vec<Option<AlertKind>>,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            footnotes: FootnoteState::default(),
            pending_image: None,
            processors: Vec::new(),
            pending_attrs: HashMap::new(),
            alert_stack: Vec::new(),
            _backend: PhantomData,
        }
    }

    /// Add a code block processor.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Parse and render markdown text with the fixed extension set.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(Parser::new_ext(markdown, extension_options()))
    }

    /// Render markdown events and return the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        let mut html = std::mem::take(&mut self.output);
        self.footnotes.render(&mut html);

        RenderResult {
            html,
            toc: self.heading.take_toc(),
        }
    }

    /// Push inline markup to the heading buffer or the output.
    ///
    /// Markup inside image alt text is dropped; only its text is kept.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.output.push_str(&html),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => {
                let mut buf = String::new();
                B::hard_break(&mut buf);
                self.push_inline(&buf);
            }
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::InlineMath(source) => self.math(&source, false),
            Event::DisplayMath(source) => self.math(&source, true),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading {
                level, id, classes, ..
            } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start_heading(
                    heading_level_to_num(level),
                    id.map(|id| id.to_string()),
                    classes.iter().map(ToString::to_string).collect(),
                );
            }
            Tag::BlockQuote(kind) => {
                if let Some(bq_kind) = kind {
                    let alert_kind = AlertKind::from(bq_kind);
                    self.alert_stack.push(Some(alert_kind));
                    B::alert_start(alert_kind, &mut self.output);
                } else {
                    self.alert_stack.push(None);
                    B::blockquote_start(&mut self.output);
                }
            }
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                self.footnotes.start_definition(&label, &mut self.output);
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link_tag = format!(r#"<a href="{}""#, escape_html(&dest_url));
                if !title.is_empty() {
                    write!(link_tag, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                link_tag.push('>');
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until end_tag.
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete_heading() {
                    let class_attr = if heading.classes.is_empty() {
                        String::new()
                    } else {
                        format!(r#" class="{}""#, escape_html(&heading.classes.join(" ")))
                    };
                    write!(
                        self.output,
                        r#"<h{level} id="{id}"{class_attr}>{body}</h{level}>"#,
                        level = heading.level,
                        id = escape_html(&heading.id),
                        body = heading.html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => match self.alert_stack.pop() {
                Some(Some(alert_kind)) => B::alert_end(alert_kind, &mut self.output),
                _ => B::blockquote_end(&mut self.output),
            },
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => self.footnotes.end_definition(&mut self.output),
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut buf = String::new();
                    B::image(&src, &alt, &title, &mut buf);
                    self.push_inline(&buf);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
        }
    }

    fn finish_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);

        // Try processors in order, fall back to normal code block rendering.
        if let Some(lang_str) = lang.as_deref() {
            for processor in &mut self.processors {
                if let ProcessResult::Inline(html) = processor.process(lang_str, &attrs, &content)
                {
                    self.output.push_str(&html);
                    return;
                }
            }
        }

        B::code_block(lang.as_deref(), &content, &mut self.output);
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
        } else if self.heading.is_active() {
            self.heading.push_text(code);
            write!(
                self.heading.html_buffer(),
                "<code>{}</code>",
                escape_html(code)
            )
            .unwrap();
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }

    fn math(&mut self, source: &str, display: bool) {
        if self.heading.is_active() {
            self.heading.push_text(source);
        }
        let mut buf = String::new();
        if display {
            B::display_math(source, &mut buf);
        } else {
            B::inline_math(source, &mut buf);
        }
        self.push_inline(&buf);
    }

    fn footnote_reference(&mut self, label: &CowStr<'_>) {
        let number = self.footnotes.number(label);
        let label = escape_html(label);
        let reference = format!(
            r##"<sup id="fnref:{label}"><a class="footnote-ref" href="#fn:{label}">{number}</a></sup>"##
        );
        self.push_inline(&reference);
    }

    fn soft_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlBackend;

    fn render_html(markdown: &str) -> RenderResult {
        MarkdownRenderer::<HtmlBackend>::new().render_markdown(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        let result = render_html("Hello, world!");
        assert_eq!(result.html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id() {
        let result = render_html("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(
            result.toc,
            vec![TocEntry {
                level: 2,
                title: "Section Title".to_owned(),
                id: "section-title".to_owned(),
            }]
        );
    }

    #[test]
    fn test_all_heading_levels_in_toc() {
        let result = render_html("# A\n\n## B\n\n### C\n\n#### D\n\n##### E\n\n###### F");
        let levels: Vec<_> = result.toc.iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_heading_attributes() {
        let result = render_html("## Install {#setup .wide}");
        assert_eq!(
            result.html,
            r#"<h2 id="setup" class="wide">Install</h2>"#
        );
        assert_eq!(result.toc[0].id, "setup");
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render_html("## Install `npm`");
        assert!(result.html.contains("<code>npm</code>"));
        assert_eq!(result.toc[0].title, "Install npm");
    }

    #[test]
    fn test_code_block() {
        let result = render_html("```rust\nfn main() {}\n```");
        assert_eq!(
            result.html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_alerts() {
        for (marker, class) in [
            ("NOTE", "note"),
            ("TIP", "tip"),
            ("IMPORTANT", "important"),
            ("WARNING", "warning"),
            ("CAUTION", "caution"),
        ] {
            let result = render_html(&format!("> [!{marker}]\n> Body **text**."));
            assert!(
                result
                    .html
                    .contains(&format!(r#"<div class="admonition {class}">"#)),
                "{marker}: {}",
                result.html
            );
            assert!(result.html.contains("<strong>text</strong>"));
        }
    }

    #[test]
    fn test_regular_blockquote() {
        let result = render_html("> Just a quote");
        assert_eq!(result.html, "<blockquote><p>Just a quote</p></blockquote>");
    }

    #[test]
    fn test_image() {
        let result = render_html("![Alt *text*](image.png \"Title\")");
        assert_eq!(
            result.html,
            r#"<p><img src="image.png" alt="Alt text" title="Title"></p>"#
        );
    }

    #[test]
    fn test_link_with_title() {
        let result = render_html("[Docs](https://example.com \"Home\")");
        assert_eq!(
            result.html,
            r#"<p><a href="https://example.com" title="Home">Docs</a></p>"#
        );
    }

    #[test]
    fn test_table() {
        let result = render_html("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            result.html,
            concat!(
                r#"<table><thead><tr><th style="text-align:left">A</th><th style="text-align:right">B</th></tr></thead>"#,
                r#"<tbody><tr><td style="text-align:left">1</td><td style="text-align:right">2</td></tr></tbody></table>"#
            )
        );
    }

    #[test]
    fn test_inline_formatting() {
        let result = render_html("*it* **bold** ~~gone~~ H~2~O x^2^");
        assert_eq!(
            result.html,
            "<p><em>it</em> <strong>bold</strong> <del>gone</del> H<sub>2</sub>O x<sup>2</sup></p>"
        );
    }

    #[test]
    fn test_smart_punctuation() {
        let result = render_html("\"Quoted\" -- dash...");
        assert_eq!(result.html, "<p>\u{201c}Quoted\u{201d} \u{2013} dash\u{2026}</p>");
    }

    #[test]
    fn test_lists_and_start() {
        let result = render_html("- a\n- b");
        assert_eq!(result.html, "<ul><li>a</li><li>b</li></ul>");

        let result = render_html("3. c\n4. d");
        assert_eq!(result.html, r#"<ol start="3"><li>c</li><li>d</li></ol>"#);
    }

    #[test]
    fn test_task_list() {
        let result = render_html("- [ ] todo\n- [x] done");
        assert!(result.html.contains(r#"<input type="checkbox" disabled> todo"#));
        assert!(
            result
                .html
                .contains(r#"<input type="checkbox" checked disabled> done"#)
        );
    }

    #[test]
    fn test_definition_list() {
        let result = render_html("Term\n: Definition");
        assert!(result.html.starts_with("<dl><dt>Term</dt><dd>"));
        assert!(result.html.contains("Definition"));
        assert!(result.html.ends_with("</dd></dl>"));
    }

    #[test]
    fn test_math() {
        let result = render_html("Energy $e=mc^2$ and $$\\sum x$$");
        assert_eq!(
            result.html,
            r#"<p>Energy <span class="arithmatex">\(e=mc^2\)</span> and <span class="arithmatex">\[\sum x\]</span></p>"#
        );
    }

    #[test]
    fn test_footnotes_collected_at_end() {
        let result = render_html("Text[^n].\n\n[^n]: The note.\n\nAfter.");
        let reference = result.html.find(r#"<sup id="fnref:n">"#).unwrap();
        let after = result.html.find("<p>After.</p>").unwrap();
        let footnotes = result.html.find(r#"<div class="footnote">"#).unwrap();
        assert!(reference < after && after < footnotes);
        assert!(result.html.contains(r#"<li id="fn:n"><p>The note."#));
    }

    #[test]
    fn test_unknown_syntax_passes_through() {
        let result = render_html("::: custom\n[[wiki]] {{var}}\n:::");
        assert!(result.html.contains("::: custom"));
        assert!(result.html.contains("{{var}}"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let result = render_html("<div class=\"note\">raw</div>\n\nText");
        assert!(result.html.starts_with("<div class=\"note\">raw</div>"));
    }

    struct InlineProcessor;

    impl CodeBlockProcessor for InlineProcessor {
        fn process(
            &mut self,
            language: &str,
            _attrs: &HashMap<String, String>,
            source: &str,
        ) -> ProcessResult {
            if language == "inline-test" {
                ProcessResult::Inline(format!("<div class=\"inline\">{}</div>", source.trim()))
            } else {
                ProcessResult::PassThrough
            }
        }
    }

    #[test]
    fn test_processor_inline_and_passthrough() {
        let mut renderer = MarkdownRenderer::<HtmlBackend>::new().with_processor(InlineProcessor);
        let result =
            renderer.render_markdown("```inline-test\nhello\n```\n\n```rust\nfn main() {}\n```");

        assert!(result.html.starts_with(r#"<div class="inline">hello</div>"#));
        assert!(result.html.contains(r#"class="language-rust""#));
    }

    #[test]
    fn test_default_renderer() {
        let mut renderer = MarkdownRenderer::<HtmlBackend>::default();
        let result = renderer.render(Parser::new("Hello"));
        assert_eq!(result.html, "<p>Hello</p>");
    }
}
