//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for enumerating and reading Markdown
//! sources, along with [`StorageError`] for unified error handling across
//! backends.

use std::path::{Path, PathBuf};

use crate::event::{StorageEventReceiver, WatchHandle};

/// A Markdown source discovered by [`Storage::scan`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Path relative to the storage root (e.g. `"notes/intro.md"`).
    pub path: PathBuf,
}

impl SourceFile {
    /// Create a source file entry from a root-relative path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Semantic error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Invalid path, or a path escaping the storage root.
    InvalidPath,
    /// Invalid watch pattern.
    InvalidPattern,
    /// Backend cannot serve the request (e.g. watcher setup failed).
    Unavailable,
    /// Other/unknown error category.
    Other,
}

impl StorageErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::PermissionDenied => "Permission denied",
            Self::InvalidPath => "Invalid path",
            Self::InvalidPattern => "Invalid pattern",
            Self::Unavailable => "Unavailable",
            Self::Other => "Error",
        }
    }
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    path: Option<PathBuf>,
    backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidInput => StorageErrorKind::InvalidPath,
            _ => StorageErrorKind::Other,
        };
        let error = Self::new(kind).with_source(err);
        match path {
            Some(p) => error.with_path(p),
            None => error,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Backend that produced the error, if known.
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: source (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        f.write_str(self.kind.as_str())?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Storage abstraction for Markdown sources.
///
/// Every path argument is relative to the storage root. Implementations must
/// reject paths that escape the root.
pub trait Storage: Send + Sync {
    /// Enumerate every indexable Markdown source.
    ///
    /// A missing root yields an empty list rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be enumerated.
    fn scan(&self) -> Result<Vec<SourceFile>, StorageError>;

    /// Read a source as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the source doesn't exist or can't be read.
    fn read(&self, path: &Path) -> Result<String, StorageError>;

    /// Check whether a source exists. Errors are treated as "doesn't exist".
    fn exists(&self, path: &Path) -> bool;

    /// Modification time as seconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the source doesn't exist or has no mtime.
    fn mtime(&self, path: &Path) -> Result<f64, StorageError>;

    /// Resolve a root-relative path to a local filesystem path.
    ///
    /// Used to locate images that sit next to a document. Backends without a
    /// local representation return `None`.
    fn local_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }

    /// Start watching for source changes.
    ///
    /// Returns a receiver for debounced events and a handle that stops
    /// watching when dropped. The default implementation never yields events.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if watching cannot be started.
    fn watch(&self) -> Result<(StorageEventReceiver, WatchHandle), StorageError> {
        Ok((StorageEventReceiver::no_op(), WatchHandle::no_op()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_file_ordering_follows_path() {
        let mut files = vec![SourceFile::new("b.md"), SourceFile::new("a/z.md")];
        files.sort();

        assert_eq!(files[0].path, PathBuf::from("a/z.md"));
    }

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found("/foo/bar");

        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert_eq!(err.path(), Some(Path::new("/foo/bar")));
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_storage_error_io_maps_kinds() {
        let cases = [
            (std::io::ErrorKind::NotFound, StorageErrorKind::NotFound),
            (
                std::io::ErrorKind::PermissionDenied,
                StorageErrorKind::PermissionDenied,
            ),
            (std::io::ErrorKind::InvalidInput, StorageErrorKind::InvalidPath),
            (std::io::ErrorKind::Interrupted, StorageErrorKind::Other),
        ];

        for (io_kind, expected) in cases {
            let err = StorageError::io(std::io::Error::new(io_kind, "boom"), None);
            assert_eq!(err.kind(), expected, "io kind {io_kind:?}");
        }
    }

    #[test]
    fn test_storage_error_source_is_exposed() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::io(io_err, None);

        assert!(err.source().is_some());
    }

    #[test]
    fn test_storage_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_storage_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_path("/foo/bar")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (path: /foo/bar)"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }

    struct ReadOnly;

    impl Storage for ReadOnly {
        fn scan(&self) -> Result<Vec<SourceFile>, StorageError> {
            Ok(vec![SourceFile::new("only.md")])
        }

        fn read(&self, _path: &Path) -> Result<String, StorageError> {
            Ok(String::from("# Only"))
        }

        fn exists(&self, path: &Path) -> bool {
            path == Path::new("only.md")
        }

        fn mtime(&self, _path: &Path) -> Result<f64, StorageError> {
            Ok(0.0)
        }
    }

    #[test]
    fn test_default_local_path_and_watch() {
        let storage = ReadOnly;

        assert!(storage.local_path(Path::new("only.md")).is_none());

        let (rx, handle) = storage.watch().unwrap();
        assert!(rx.try_recv().is_none());
        handle.stop();
    }
}
