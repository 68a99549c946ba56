//! Indexed document model.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use folio_chunks::{ChunkKind, ChunkedDocument};
use folio_renderer::TocEntry;
use serde::Serialize;

/// Access tier of a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed, searchable and reachable by slug.
    #[default]
    Public,
    /// Searchable and reachable by slug, but not listed.
    Unlisted,
    /// Not served by any read path.
    Hidden,
}

impl Visibility {
    /// Parse a visibility value, case-insensitively.
    ///
    /// Unknown values fall back to [`Visibility::Public`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "unlisted" => Self::Unlisted,
            "hidden" => Self::Hidden,
            _ => Self::Public,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Hidden => "hidden",
        }
    }

    /// Whether the document may be served at all.
    #[must_use]
    pub fn is_visible(self) -> bool {
        self != Self::Hidden
    }
}

/// Document metadata, as returned by listings and search.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DocumentMeta {
    pub slug: String,
    pub title: String,
    /// Date as written in the front matter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub tags: Vec<String>,
    /// Explicit summary, or one derived from the body text.
    pub summary: String,
    pub visibility: Visibility,
    /// Source path relative to the source root, `/`-separated.
    pub path: String,
    pub word_count: usize,
    /// Estimated reading time (e.g. `"3 min"`).
    pub reading_time: String,
    /// Front matter keys with no dedicated field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A fully indexed document.
///
/// Documents are immutable once built. Re-indexing replaces the whole value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    pub meta: DocumentMeta,
    /// Rendered HTML including the TOC.
    pub content_html: String,
    /// Plain text for search and summaries.
    pub content_text: String,
    /// TOC fragment, empty when the document has no headings.
    pub toc_html: String,
    /// Headings in document order.
    pub headings: Vec<TocEntry>,
    /// Chunks for progressive delivery, without a leading TOC.
    pub chunks: ChunkedDocument,
    /// Source modification time, seconds since the Unix epoch.
    pub updated_at: f64,
}

impl Document {
    /// Chunk layout without the chunk bodies.
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest {
            meta: self.meta.clone(),
            total_chunks: self.chunks.len(),
            toc_html: self.toc_html.clone(),
            chunk_types: self.chunks.kinds.clone(),
            placeholder_ids: self.chunks.placeholder_ids.clone(),
        }
    }
}

/// Chunk layout of a document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Manifest {
    pub meta: DocumentMeta,
    pub total_chunks: usize,
    pub toc_html: String,
    pub chunk_types: Vec<ChunkKind>,
    pub placeholder_ids: Vec<Option<String>>,
}

/// Pagination details of a search page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// One page of search results.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchPage {
    pub items: Vec<DocumentMeta>,
    pub page: PageInfo,
}

/// Convert a source path to a slug.
///
/// Examples:
/// - `"hello.md"` -> `"hello"`
/// - `"notes/2024/Intro.MD"` -> `"notes/2024/Intro"`
/// - `"README"` -> `"README"`
#[must_use]
pub fn slug_for_path(path: &Path) -> String {
    let joined = source_path_string(path);
    let len = joined.len();
    if len >= 3 && joined.is_char_boundary(len - 3) && joined[len - 3..].eq_ignore_ascii_case(".md")
    {
        joined[..len - 3].to_owned()
    } else {
        joined
    }
}

/// Root-relative path with `/` separators.
pub(crate) fn source_path_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
