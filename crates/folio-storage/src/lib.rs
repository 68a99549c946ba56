//! Source tree access for the folio indexer.
//!
//! The [`Storage`] trait hides where Markdown sources live. The document store
//! only ever talks to this trait, which keeps indexing testable against a
//! temporary directory and leaves room for other backends.
//!
//! # Architecture
//!
//! - [`Storage`]: `scan()`, `read()`, `exists()`, `mtime()`, `local_path()` and `watch()`
//! - [`FsStorage`]: local filesystem backend with `notify`-based watching
//! - [`StorageEvent`]: debounced change notifications delivered over a channel
//!
//! All paths crossing this API are relative to the storage root
//! (e.g. `"guide.md"`, `"notes/2024/intro.md"`).
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use folio_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("docs"));
//! for file in storage.scan().unwrap() {
//!     let body = storage.read(&file.path).unwrap();
//!     println!("{}: {} bytes", file.path.display(), body.len());
//! }
//! ```

mod debouncer;
mod event;
mod fs;
mod storage;

pub use event::{StorageEvent, StorageEventKind, StorageEventReceiver, WatchHandle};
pub use fs::FsStorage;
pub use storage::{SourceFile, Storage, StorageError, StorageErrorKind};
