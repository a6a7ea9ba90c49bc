//! notify-backed watcher producing debounced change batches.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::debouncer::EventDebouncer;
use crate::event::{ChangeKind, ChangeReceiver, WatchHandle, change_channel};

/// Default quiet period before a change is delivered.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// How often ready events are forwarded.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Number of batches buffered before the forwarder waits for the consumer.
const CHANNEL_CAPACITY: usize = 64;

/// Error returned when a watch cannot be established.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("Failed to create file watcher: {0}")]
    Init(#[source] notify::Error),
}

/// Something to watch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchTarget {
    /// Every path below a directory.
    Dir(PathBuf),
    /// Exactly one file.
    ///
    /// Watched through its parent directory so that saves performed as
    /// write-to-temp-then-rename keep being noticed.
    File(PathBuf),
}

impl WatchTarget {
    fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Dir(dir) => path.starts_with(dir),
            Self::File(file) => path == file,
        }
    }

    fn watch_spec(&self) -> (&Path, RecursiveMode) {
        match self {
            Self::Dir(dir) => (dir, RecursiveMode::Recursive),
            Self::File(file) => (
                file.parent().unwrap_or(file),
                RecursiveMode::NonRecursive,
            ),
        }
    }
}

/// Starts filesystem watches.
pub struct FsWatcher;

impl FsWatcher {
    /// Watch `targets`, delivering debounced batches on the returned receiver.
    ///
    /// Must be called from within a tokio runtime. Watching stops when the
    /// returned [`WatchHandle`] is dropped.
    pub fn start(
        targets: Vec<WatchTarget>,
        debounce: Duration,
    ) -> Result<(ChangeReceiver, WatchHandle), WatchError> {
        let debouncer = Arc::new(EventDebouncer::new(debounce));
        let debouncer_for_watcher = Arc::clone(&debouncer);
        let filter = targets.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    for (path, kind) in classify(&event) {
                        if filter.iter().any(|t| t.matches(&path)) {
                            tracing::debug!(path = %path.display(), ?kind, "Recorded filesystem event");
                            debouncer_for_watcher.record(path, kind);
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "File watcher error"),
            }
        })
        .map_err(WatchError::Init)?;

        for target in &targets {
            let (path, mode) = target.watch_spec();
            watcher
                .watch(path, mode)
                .map_err(|source| WatchError::Watch {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let (tx, rx) = change_channel(CHANNEL_CAPACITY);
        let forwarder = tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            loop {
                interval.tick().await;
                let ready = debouncer.drain_ready();
                if ready.is_empty() {
                    continue;
                }
                if tx.send(ready).await.is_err() {
                    // Receiver dropped
                    break;
                }
            }
        });

        Ok((rx, WatchHandle::new(watcher, forwarder)))
    }
}

/// Map a notify event onto per-path change kinds.
///
/// Metadata-only and access events are dropped; renames become a removal of
/// the old name and an addition of the new one.
fn classify(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Added,
        EventKind::Remove(_) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Added,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.iter();
            let mut changes = Vec::with_capacity(2);
            if let Some(from) = paths.next() {
                changes.push((from.clone(), ChangeKind::Removed));
            }
            if let Some(to) = paths.next() {
                changes.push((to.clone(), ChangeKind::Added));
            }
            return changes;
        }
        EventKind::Modify(_) => ChangeKind::Changed,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event.paths.iter().map(|p| (p.clone(), kind)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use pretty_assertions::assert_eq;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_classify_basic_kinds() {
        assert_eq!(
            classify(&event(EventKind::Create(CreateKind::File), &["/w/a.md"])),
            vec![(PathBuf::from("/w/a.md"), ChangeKind::Added)]
        );
        assert_eq!(
            classify(&event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/w/a.md"]
            )),
            vec![(PathBuf::from("/w/a.md"), ChangeKind::Changed)]
        );
        assert_eq!(
            classify(&event(EventKind::Remove(RemoveKind::File), &["/w/a.md"])),
            vec![(PathBuf::from("/w/a.md"), ChangeKind::Removed)]
        );
    }

    #[test]
    fn test_classify_rename_both() {
        let changes = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/.a.md.swp", "/w/a.md"],
        ));
        assert_eq!(
            changes,
            vec![
                (PathBuf::from("/w/.a.md.swp"), ChangeKind::Removed),
                (PathBuf::from("/w/a.md"), ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_classify_ignores_metadata() {
        let changes = classify(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)),
            &["/w/a.md"],
        ));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_target_matching() {
        let dir = WatchTarget::Dir(PathBuf::from("/w/in"));
        assert!(dir.matches(Path::new("/w/in/a/b.md")));
        assert!(!dir.matches(Path::new("/w/input/b.md")));

        let file = WatchTarget::File(PathBuf::from("/w/page.html"));
        assert!(file.matches(Path::new("/w/page.html")));
        assert!(!file.matches(Path::new("/w/other.html")));
        assert_eq!(
            file.watch_spec(),
            (Path::new("/w"), RecursiveMode::NonRecursive)
        );
    }

    #[tokio::test]
    async fn test_start_on_missing_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let result = FsWatcher::start(
            vec![WatchTarget::Dir(temp.path().join("missing"))],
            DEFAULT_DEBOUNCE,
        );
        assert!(matches!(result, Err(WatchError::Watch { .. })));
    }
}
