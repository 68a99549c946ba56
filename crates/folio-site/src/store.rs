//! Versioned document store.
//!
//! Provides [`DocumentStore`], the slug to [`Document`] map behind every
//! query, together with the version counter callers use for cache
//! validation.
//!
//! # Thread Safety
//!
//! `DocumentStore` is designed for concurrent access:
//! - Parsing, rendering and chunking run without holding any lock
//! - Only the final map update and version bump take the write lock
//! - Readers take the read lock just long enough to clone an `Arc<Document>`
//!
//! A reader therefore sees either the old or the new version of a document,
//! never a mix of both.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use folio_site::{DocumentStore, StoreConfig};
//! use folio_storage::FsStorage;
//!
//! let storage = Arc::new(FsStorage::new(PathBuf::from("docs")));
//! let store = Arc::new(DocumentStore::new(storage, StoreConfig::default()));
//!
//! store.rescan_all();
//! store.start_watch().unwrap();
//!
//! for meta in store.list_public() {
//!     println!("{} ({})", meta.title, meta.reading_time);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use folio_chunks::{Chunker, ChunkerConfig};
use folio_renderer::{render_document, strip_leading_toc};
use folio_storage::{Storage, StorageError, StorageEvent, StorageEventKind, WatchHandle};

use crate::document::{Document, DocumentMeta, slug_for_path, source_path_string};
use crate::frontmatter::{self, FrontMatterError};
use crate::stats::{reading_time, summarize, word_count};

/// Error returned when a source file cannot be turned into a document.
///
/// The store only logs these; the previous version of the document, if
/// any, keeps being served.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Source could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
    /// Front matter is malformed.
    #[error("Invalid front matter in {}: {source}", .path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
}

/// Configuration for [`DocumentStore`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Chunk sizing and image preview settings.
    pub chunker: ChunkerConfig,
    /// Web root for `/`-prefixed image sources.
    ///
    /// If `None`, such images get no preview.
    pub public_dir: Option<PathBuf>,
    /// Assumed reading speed for reading time estimates.
    pub words_per_minute: u32,
    /// Length of derived summaries, in characters.
    pub summary_length: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            public_dir: None,
            words_per_minute: 400,
            summary_length: 200,
        }
    }
}

#[derive(Default)]
struct StoreState {
    documents: BTreeMap<String, Arc<Document>>,
    version: u64,
}

/// In-memory index of rendered documents.
pub struct DocumentStore {
    storage: Arc<dyn Storage>,
    config: StoreConfig,
    chunker: Chunker,
    state: RwLock<StoreState>,
    watch: Mutex<Option<WatchHandle>>,
}

impl DocumentStore {
    /// Create an empty store over `storage`.
    ///
    /// Nothing is indexed until [`rescan_all`](Self::rescan_all) or
    /// [`index_file`](Self::index_file) is called.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: StoreConfig) -> Self {
        let mut chunker = Chunker::new(config.chunker.clone());
        if let Some(public_dir) = &config.public_dir {
            chunker = chunker.with_public_dir(public_dir);
        }

        Self {
            storage,
            config,
            chunker,
            state: RwLock::new(StoreState::default()),
            watch: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current version. Bumped once per committed change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.read_state().version
    }

    /// Number of indexed documents, hidden ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_state().documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_state().documents.is_empty()
    }

    /// Parse and render a source file without committing it.
    ///
    /// # Arguments
    ///
    /// * `path` - Source path relative to the storage root
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if the file cannot be read or its front
    /// matter is malformed.
    pub fn load(&self, path: &Path) -> Result<Document, IndexError> {
        let read_error = |source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        };
        let source = self.storage.read(path).map_err(read_error)?;
        let updated_at = self.storage.mtime(path).map_err(read_error)?;

        let (front_matter, body) =
            frontmatter::parse(&source).map_err(|source| IndexError::FrontMatter {
                path: path.to_path_buf(),
                source,
            })?;

        let rendered = render_document(body);

        // The TOC is delivered separately with the manifest.
        let base_dir = self
            .storage
            .local_path(path.parent().unwrap_or_else(|| Path::new("")));
        let chunks = self
            .chunker
            .chunk(&strip_leading_toc(&rendered.html), base_dir.as_deref());

        let words = word_count(&rendered.plain_text);
        let title = front_matter.title.unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let summary = front_matter
            .summary
            .unwrap_or_else(|| summarize(&rendered.plain_text, self.config.summary_length));

        let meta = DocumentMeta {
            slug: slug_for_path(path),
            title,
            date: front_matter.date,
            tags: front_matter.tags,
            summary,
            visibility: front_matter.visibility,
            path: source_path_string(path),
            word_count: words,
            reading_time: reading_time(words, self.config.words_per_minute),
            extra: front_matter.extra,
        };

        Ok(Document {
            meta,
            content_html: rendered.html,
            content_text: rendered.plain_text,
            toc_html: rendered.toc_html,
            headings: rendered.toc,
            chunks,
            updated_at,
        })
    }

    /// Index one source file, replacing any previous version.
    ///
    /// Returns `false` if the file could not be indexed. The failure is
    /// logged and the store is left unchanged.
    pub fn index_file(&self, path: &Path) -> bool {
        let document = match self.load(path) {
            Ok(document) => Arc::new(document),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to index document");
                return false;
            }
        };

        let slug = document.meta.slug.clone();
        let version = {
            let mut state = self.write_state();
            state.documents.insert(slug.clone(), document);
            state.version += 1;
            state.version
        };
        tracing::debug!(slug = %slug, version, "Indexed document");
        true
    }

    /// Remove the document built from `path`.
    ///
    /// Returns `false` without bumping the version if no such document
    /// exists. Hidden documents are removed like any other.
    pub fn remove_file(&self, path: &Path) -> bool {
        let slug = slug_for_path(path);
        let version = {
            let mut state = self.write_state();
            if state.documents.remove(&slug).is_none() {
                return false;
            }
            state.version += 1;
            state.version
        };
        tracing::debug!(slug = %slug, version, "Removed document");
        true
    }

    /// Re-index every source file as a single change.
    ///
    /// Documents whose source disappeared are dropped. Documents that fail
    /// to parse keep their previous version. The version is bumped exactly
    /// once, even when nothing changed.
    ///
    /// Returns the number of documents in the store afterwards.
    pub fn rescan_all(&self) -> usize {
        let files = match self.storage.scan() {
            Ok(files) => Some(files),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to scan storage");
                None
            }
        };

        let loaded: Option<Vec<(String, Option<Arc<Document>>)>> = files.map(|files| {
            files
                .iter()
                .map(|file| {
                    let document = match self.load(&file.path) {
                        Ok(document) => Some(Arc::new(document)),
                        Err(e) => {
                            tracing::warn!(path = %file.path.display(), error = %e, "Failed to index document");
                            None
                        }
                    };
                    (slug_for_path(&file.path), document)
                })
                .collect()
        });

        let (count, version) = {
            let mut state = self.write_state();
            if let Some(loaded) = loaded {
                let mut scanned = BTreeSet::new();
                for (slug, document) in loaded {
                    if let Some(document) = document {
                        state.documents.insert(slug.clone(), document);
                    }
                    scanned.insert(slug);
                }
                // Documents committed while the scan was running are not in
                // the listing, so only drop those whose source is gone.
                let storage = &self.storage;
                state.documents.retain(|slug, document| {
                    scanned.contains(slug) || storage.exists(Path::new(&document.meta.path))
                });
            }
            state.version += 1;
            (state.documents.len(), state.version)
        };

        tracing::info!(documents = count, version, "Rescan completed");
        count
    }

    /// Apply one change notification.
    pub fn apply_event(&self, event: &StorageEvent) {
        match event.kind {
            StorageEventKind::Removed => {
                self.remove_file(&event.path);
            }
            StorageEventKind::Created | StorageEventKind::Modified => {
                self.index_file(&event.path);
            }
        }
    }

    /// Start applying source changes in the background.
    ///
    /// Does nothing if watching is already active. The background thread
    /// holds only a weak reference and ends once the store is dropped or
    /// [`stop_watch`](Self::stop_watch) is called.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the storage cannot be watched.
    pub fn start_watch(self: &Arc<Self>) -> Result<(), StorageError> {
        let mut watch = self.watch.lock().unwrap_or_else(PoisonError::into_inner);
        if watch.is_some() {
            return Ok(());
        }

        let (events, handle) = self.storage.watch()?;
        let store = Arc::downgrade(self);
        std::thread::Builder::new()
            .name("folio-watch".to_owned())
            .spawn(move || {
                for event in events.iter() {
                    let Some(store) = store.upgrade() else {
                        break;
                    };
                    store.apply_event(&event);
                }
                tracing::debug!("Watch loop stopped");
            })
            .map_err(|e| StorageError::io(e, None))?;

        *watch = Some(handle);
        tracing::info!("Watching for source changes");
        Ok(())
    }

    /// Stop watching. Returns `false` if watching was not active.
    pub fn stop_watch(&self) -> bool {
        let handle = self
            .watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Document by slug, regardless of visibility.
    pub(crate) fn lookup(&self, slug: &str) -> Option<Arc<Document>> {
        self.read_state().documents.get(slug).cloned()
    }

    /// All documents in slug order, regardless of visibility.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Document>> {
        self.read_state().documents.values().cloned().collect()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
