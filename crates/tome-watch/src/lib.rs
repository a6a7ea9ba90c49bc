//! Filesystem change notification for tome.
//!
//! [`FsWatcher`] turns raw `notify` events into debounced batches of
//! [`ChangeEvent`]s delivered on a tokio channel. Anything that can produce
//! such batches (tests, alternative backends) can feed the same
//! [`ChangeReceiver`] through [`change_channel`].

mod debouncer;
mod event;
mod watcher;

pub use event::{
    ChangeEvent, ChangeKind, ChangeReceiver, ChangeSender, WatchHandle, change_channel,
};
pub use watcher::{DEFAULT_DEBOUNCE, FsWatcher, WatchError, WatchTarget};
