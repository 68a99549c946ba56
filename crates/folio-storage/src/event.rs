//! Change notifications produced by [`Storage::watch`](crate::Storage::watch).

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;

/// Kind of source change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageEventKind {
    /// Source was created.
    Created,
    /// Source content changed.
    Modified,
    /// Source was deleted.
    Removed,
}

impl fmt::Display for StorageEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        })
    }
}

/// A debounced source change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    /// Path relative to the storage root (e.g. `"notes/intro.md"`).
    pub path: PathBuf,
    /// Kind of change.
    pub kind: StorageEventKind,
}

impl StorageEvent {
    /// Create an event for a root-relative path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: StorageEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Whether the source no longer exists after this event.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.kind == StorageEventKind::Removed
    }
}

/// Receiving end of a watch subscription.
///
/// The stream ends (`recv()` returns `None`) once the paired [`WatchHandle`]
/// is dropped and the backend's delivery thread has exited.
pub struct StorageEventReceiver {
    rx: mpsc::Receiver<StorageEvent>,
}

impl StorageEventReceiver {
    pub(crate) fn new(rx: mpsc::Receiver<StorageEvent>) -> Self {
        Self { rx }
    }

    /// Block until the next event, or `None` when the stream is closed.
    #[must_use]
    pub fn recv(&self) -> Option<StorageEvent> {
        self.rx.recv().ok()
    }

    /// Poll for an event without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<StorageEvent> {
        self.rx.try_recv().ok()
    }

    /// Blocking iterator that ends when the stream is closed.
    pub fn iter(&self) -> impl Iterator<Item = StorageEvent> + '_ {
        self.rx.iter()
    }

    /// A receiver whose stream is already closed.
    pub(crate) fn no_op() -> Self {
        let (_tx, rx) = mpsc::channel();
        Self { rx }
    }
}

/// Stops a watch subscription when dropped.
pub struct WatchHandle {
    _shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    /// Dropping `shutdown` disconnects the delivery thread's receiver.
    pub(crate) fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            _shutdown: Some(shutdown),
        }
    }

    /// Stop watching now.
    pub fn stop(mut self) {
        self._shutdown.take();
    }

    pub(crate) fn no_op() -> Self {
        Self { _shutdown: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_display() {
        assert_eq!(StorageEventKind::Created.to_string(), "created");
        assert_eq!(StorageEventKind::Modified.to_string(), "modified");
        assert_eq!(StorageEventKind::Removed.to_string(), "removed");
    }

    #[test]
    fn test_is_removal() {
        assert!(StorageEvent::new("a.md", StorageEventKind::Removed).is_removal());
        assert!(!StorageEvent::new("a.md", StorageEventKind::Created).is_removal());
    }

    #[test]
    fn test_receiver_delivers_in_order_then_closes() {
        let (tx, rx) = mpsc::channel();
        let receiver = StorageEventReceiver::new(rx);

        let events = vec![
            StorageEvent::new("a.md", StorageEventKind::Created),
            StorageEvent::new("b.md", StorageEventKind::Modified),
        ];
        for event in &events {
            tx.send(event.clone()).unwrap();
        }
        drop(tx);

        let received: Vec<_> = receiver.iter().collect();
        assert_eq!(received, events);
        assert!(receiver.recv().is_none());
    }

    #[test]
    fn test_receiver_try_recv_empty() {
        let (_tx, rx) = mpsc::channel();
        let receiver = StorageEventReceiver::new(rx);

        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_no_op_receiver_is_closed() {
        assert!(StorageEventReceiver::no_op().recv().is_none());
    }

    #[test]
    fn test_watch_handle_drop_disconnects() {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = WatchHandle::new(tx);

        drop(handle);

        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_watch_handle_stop_disconnects() {
        let (tx, rx) = mpsc::channel::<()>();
        WatchHandle::new(tx).stop();

        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_types_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WatchHandle>();
        assert_send::<StorageEventReceiver>();
    }
}
