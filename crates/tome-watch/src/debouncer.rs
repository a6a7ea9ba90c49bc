//! Event debouncing.
//!
//! Editors commonly emit several events for a single save (truncate, write,
//! chmod, rename). The debouncer folds them into one event per path and only
//! releases it once the path has been quiet for the debounce duration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::event::{ChangeEvent, ChangeKind};

struct Pending {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe per-path event coalescer.
pub(crate) struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, Pending>>,
    debounce: Duration,
}

impl EventDebouncer {
    pub fn new(debounce: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            debounce,
        }
    }

    /// Record a raw event, pushing the path's deadline back.
    ///
    /// Called from the notify callback thread.
    pub fn record(&self, path: PathBuf, kind: ChangeKind) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + self.debounce;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(Pending { kind, deadline });
            }
            Entry::Occupied(mut entry) => match Self::coalesce(entry.get().kind, kind) {
                Some(kind) => {
                    *entry.get_mut() = Pending { kind, deadline };
                }
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Fold a new event into a pending one.
    ///
    /// `None` drops the path entirely: it appeared and vanished within one
    /// debounce window, so nothing observable happened.
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::{Added, Changed, Removed};

        match (existing, new) {
            (Added, Added | Changed) => Some(Added),
            (Added, Removed) => None,

            (Changed, Added) => Some(Added),
            (Changed, Changed) => Some(Changed),
            (Changed, Removed) => Some(Removed),

            // Replaced in place (write-to-temp then rename)
            (Removed, Added) => Some(Changed),
            (Removed, Changed | Removed) => Some(Removed),
        }
    }

    /// Take every event whose deadline has passed, sorted by path.
    pub fn drain_ready(&self) -> Vec<ChangeEvent> {
        self.drain_ready_at(Instant::now())
    }

    fn drain_ready_at(&self, now: Instant) -> Vec<ChangeEvent> {
        let mut pending = self.pending.lock().unwrap();

        let mut ready: Vec<ChangeEvent> = pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(path, p)| ChangeEvent::new(path.clone(), p.kind))
            .collect();

        for event in &ready {
            pending.remove(&event.path);
        }

        ready.sort_by(|a, b| a.path.cmp(&b.path));
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn later(debouncer: &EventDebouncer) -> Vec<ChangeEvent> {
        debouncer.drain_ready_at(Instant::now() + Duration::from_secs(1))
    }

    #[test]
    fn test_event_held_until_deadline() {
        let debouncer = EventDebouncer::new(Duration::from_secs(60));
        debouncer.record(PathBuf::from("/w/a.md"), ChangeKind::Changed);

        assert!(debouncer.drain_ready().is_empty());

        let events = debouncer.drain_ready_at(Instant::now() + Duration::from_secs(61));
        assert_eq!(events, vec![ChangeEvent::new("/w/a.md", ChangeKind::Changed)]);
        assert!(debouncer.drain_ready_at(Instant::now() + Duration::from_secs(61)).is_empty());
    }

    #[test]
    fn test_repeated_changes_coalesce() {
        let debouncer = EventDebouncer::new(Duration::ZERO);
        for _ in 0..3 {
            debouncer.record(PathBuf::from("/w/a.md"), ChangeKind::Changed);
        }
        assert_eq!(
            later(&debouncer),
            vec![ChangeEvent::new("/w/a.md", ChangeKind::Changed)]
        );
    }

    #[test]
    fn test_added_then_removed_disappears() {
        let debouncer = EventDebouncer::new(Duration::ZERO);
        debouncer.record(PathBuf::from("/w/tmp.md"), ChangeKind::Added);
        debouncer.record(PathBuf::from("/w/tmp.md"), ChangeKind::Removed);
        assert!(later(&debouncer).is_empty());
    }

    #[test]
    fn test_removed_then_added_is_change() {
        let debouncer = EventDebouncer::new(Duration::ZERO);
        debouncer.record(PathBuf::from("/w/a.md"), ChangeKind::Removed);
        debouncer.record(PathBuf::from("/w/a.md"), ChangeKind::Added);
        assert_eq!(
            later(&debouncer),
            vec![ChangeEvent::new("/w/a.md", ChangeKind::Changed)]
        );
    }

    #[test]
    fn test_ready_events_sorted_by_path() {
        let debouncer = EventDebouncer::new(Duration::ZERO);
        debouncer.record(PathBuf::from("/w/b.md"), ChangeKind::Added);
        debouncer.record(PathBuf::from("/w/a.md"), ChangeKind::Changed);
        assert_eq!(
            later(&debouncer),
            vec![
                ChangeEvent::new("/w/a.md", ChangeKind::Changed),
                ChangeEvent::new("/w/b.md", ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_coalesce_matrix() {
        use ChangeKind::{Added, Changed, Removed};

        assert_eq!(EventDebouncer::coalesce(Added, Added), Some(Added));
        assert_eq!(EventDebouncer::coalesce(Added, Changed), Some(Added));
        assert_eq!(EventDebouncer::coalesce(Added, Removed), None);

        assert_eq!(EventDebouncer::coalesce(Changed, Added), Some(Added));
        assert_eq!(EventDebouncer::coalesce(Changed, Changed), Some(Changed));
        assert_eq!(EventDebouncer::coalesce(Changed, Removed), Some(Removed));

        assert_eq!(EventDebouncer::coalesce(Removed, Added), Some(Changed));
        assert_eq!(EventDebouncer::coalesce(Removed, Changed), Some(Removed));
        assert_eq!(EventDebouncer::coalesce(Removed, Removed), Some(Removed));
    }
}
