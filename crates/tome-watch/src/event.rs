//! Change event types and the channel they travel on.

use std::path::PathBuf;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Kind of change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Path appeared.
    Added,
    /// Content changed.
    Changed,
    /// Path disappeared.
    Removed,
}

/// A single change to a watched path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Absolute path.
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Sending half of a change channel.
pub type ChangeSender = mpsc::Sender<Vec<ChangeEvent>>;

/// Receives batches of change events.
///
/// Each batch holds the events that became ready together after debouncing.
/// A closed channel ends the stream.
pub struct ChangeReceiver {
    rx: mpsc::Receiver<Vec<ChangeEvent>>,
}

impl ChangeReceiver {
    pub(crate) fn new(rx: mpsc::Receiver<Vec<ChangeEvent>>) -> Self {
        Self { rx }
    }

    /// Wait for the next batch. Returns `None` once all senders are gone.
    pub async fn recv(&mut self) -> Option<Vec<ChangeEvent>> {
        self.rx.recv().await
    }

    /// Take a batch if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Option<Vec<ChangeEvent>> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected sender/receiver pair with room for `capacity` batches.
#[must_use]
pub fn change_channel(capacity: usize) -> (ChangeSender, ChangeReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ChangeReceiver::new(rx))
}

/// Keeps a watch alive.
///
/// Dropping the handle stops the underlying watcher and the task that
/// forwards debounced batches, which in turn closes the receiver.
pub struct WatchHandle {
    _watcher: Option<RecommendedWatcher>,
    forwarder: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub(crate) fn new(watcher: RecommendedWatcher, forwarder: JoinHandle<()>) -> Self {
        Self {
            _watcher: Some(watcher),
            forwarder: Some(forwarder),
        }
    }

    /// Stop watching immediately (consumes the handle).
    pub fn stop(self) {}
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}
