//! Document indexing and queries for folio.
//!
//! This crate provides:
//! - [`DocumentStore`]: versioned, thread-safe index of rendered documents
//! - Queries: listing, search, lookups by slug, chunk retrieval
//! - Front matter parsing and text statistics
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use folio_site::{DocumentStore, StoreConfig};
//! use folio_storage::FsStorage;
//!
//! let storage = Arc::new(FsStorage::new(PathBuf::from("docs")));
//! let store = DocumentStore::new(storage, StoreConfig::default());
//! store.rescan_all();
//!
//! // Search by tag
//! let tagged = store.search("tag:rust");
//!
//! // Fetch the chunk layout, then the chunks one by one
//! if let Some(manifest) = store.manifest("guide") {
//!     for index in 0..manifest.total_chunks {
//!         let chunk = store.chunk("guide", index);
//!     }
//! }
//! ```

mod document;
pub mod frontmatter;
mod query;
pub mod stats;
mod store;

pub use document::{
    Document, DocumentMeta, Manifest, PageInfo, SearchPage, Visibility, slug_for_path,
};
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use store::{DocumentStore, IndexError, StoreConfig};

// Re-export chunk and heading types for convenience
pub use folio_chunks::{ChunkKind, ChunkedDocument, ChunkerConfig};
pub use folio_renderer::TocEntry;
