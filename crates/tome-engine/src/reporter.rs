//! User-facing progress notifications.

use std::sync::Mutex;

/// Receives notices meant for the person running a conversion.
///
/// Diagnostics for developers go through `tracing`; this trait carries the
/// handful of messages a user expects to see (`wrote: site/index.html`).
pub trait Reporter: Send + Sync {
    /// An output file was written. `path` is in display form.
    fn wrote(&self, path: &str);

    /// Something went wrong but the run continues.
    fn warning(&self, message: &str);

    /// The initial pass of a watch session finished and `location` is now
    /// being watched.
    fn watching(&self, _location: &str) {}
}

/// Reporter that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn wrote(&self, _path: &str) {}

    fn warning(&self, _message: &str) {}
}

/// Reporter that keeps every notice, for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    written: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    watching: Mutex<Option<String>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths reported as written, in report order.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap().clone()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    /// Location passed to the last [`Reporter::watching`] call.
    #[must_use]
    pub fn watching_location(&self) -> Option<String> {
        self.watching.lock().unwrap().clone()
    }

    /// Forget the written paths and warnings recorded so far.
    pub fn clear(&self) {
        self.written.lock().unwrap().clear();
        self.warnings.lock().unwrap().clear();
    }
}

impl Reporter for RecordingReporter {
    fn wrote(&self, path: &str) {
        self.written.lock().unwrap().push(path.to_owned());
    }

    fn warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_owned());
    }

    fn watching(&self, location: &str) {
        *self.watching.lock().unwrap() = Some(location.to_owned());
    }
}
