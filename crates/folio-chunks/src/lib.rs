//! Progressive delivery chunks for rendered documents.
//!
//! A [`Chunker`] splits rendered HTML into text chunks followed by image
//! chunks. Images are cut out first and replaced with placeholder blocks
//! (`<div class="img-ph" data-ph="ph0">`) so the text can be shown before
//! any image is fetched. Images stored locally also get a blurred inline
//! preview (LQIP) in the placeholder.
//!
//! The passes are regex-based and assume generator-controlled HTML, such
//! as the output of `folio-renderer`. They are not a general HTML parser.
//!
//! # Example
//!
//! ```
//! use folio_chunks::{ChunkKind, Chunker};
//!
//! let chunker = Chunker::default();
//! let doc = chunker.chunk("<p>Hello</p><p><img src=\"https://example.com/a.png\"></p>", None);
//!
//! assert_eq!(doc.kinds, vec![ChunkKind::Text, ChunkKind::Image]);
//! assert_eq!(doc.placeholder_ids, vec![None, Some("ph0".to_owned())]);
//! ```

mod extract;
mod lqip;
mod segment;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use extract::ExtractedImage;
pub use lqip::{Lqip, LqipError, generate as generate_lqip};

/// Minimum characters per merged text chunk.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 3000;
/// Thumbnail width of generated previews, in pixels.
pub const DEFAULT_LQIP_WIDTH: u32 = 24;
/// JPEG quality of generated previews.
pub const DEFAULT_LQIP_QUALITY: u8 = 30;

/// Kind of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Text,
    Image,
}

impl ChunkKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Chunks of one document with their parallel kind and placeholder arrays.
///
/// All text chunks come first, in document order, followed by image chunks
/// in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkedDocument {
    pub chunks: Vec<String>,
    pub kinds: Vec<ChunkKind>,
    /// Placeholder id for image chunks, `None` for text chunks.
    pub placeholder_ids: Vec<Option<String>>,
}

impl ChunkedDocument {
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn push(&mut self, chunk: String, kind: ChunkKind, placeholder_id: Option<String>) {
        self.chunks.push(chunk);
        self.kinds.push(kind);
        self.placeholder_ids.push(placeholder_id);
    }
}

/// Chunk sizing and preview settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub min_chunk_size: usize,
    pub lqip_width: u32,
    pub lqip_quality: u8,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            lqip_width: DEFAULT_LQIP_WIDTH,
            lqip_quality: DEFAULT_LQIP_QUALITY,
        }
    }
}

/// Splits rendered HTML into chunks.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
    public_dir: Option<PathBuf>,
}

impl Chunker {
    #[must_use]
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            public_dir: None,
        }
    }

    /// Resolve `/`-prefixed image sources under `public_dir`.
    #[must_use]
    pub fn with_public_dir(mut self, public_dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(public_dir.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk `html`. Relative image sources resolve against `base_dir`.
    ///
    /// Never fails: images that cannot be previewed are still extracted,
    /// just without an inline preview. Empty input gives an empty result.
    #[must_use]
    pub fn chunk(&self, html: &str, base_dir: Option<&Path>) -> ChunkedDocument {
        let mut document = ChunkedDocument::default();
        if html.is_empty() {
            return document;
        }

        let locations = extract::ImageLocations {
            base_dir,
            public_dir: self.public_dir.as_deref(),
        };
        let (text, images) = extract::extract_images(
            html,
            locations,
            self.config.lqip_width,
            self.config.lqip_quality,
        );

        for chunk in segment::segment(&text, self.config.min_chunk_size) {
            document.push(chunk, ChunkKind::Text, None);
        }
        for image in images {
            document.push(image.html, ChunkKind::Image, Some(image.placeholder_id));
        }
        document
    }
}
