//! Ignore patterns for source files.

use std::path::Path;

use glob::{MatchOptions, Pattern};
use tome_paths::to_slash;

use crate::error::ConvertError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled set of glob patterns.
///
/// A pattern without `/` is matched against the file name alone, so `*.tmp`
/// ignores temporary files at any depth. A pattern containing `/` is matched
/// against the whole input-relative path, written with forward slashes.
#[derive(Clone, Debug, Default)]
pub struct IgnoreSet {
    basename: Vec<Pattern>,
    path: Vec<Pattern>,
}

impl IgnoreSet {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Validation`] for empty or malformed patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConvertError> {
        let mut set = Self::default();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                return Err(ConvertError::Validation(
                    "Ignore patterns must not be empty".to_owned(),
                ));
            }
            let pattern = Pattern::new(raw).map_err(|e| {
                ConvertError::Validation(format!("Invalid ignore pattern '{raw}': {e}"))
            })?;
            if raw.contains('/') {
                set.path.push(pattern);
            } else {
                set.basename.push(pattern);
            }
        }
        Ok(set)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.basename.is_empty() && self.path.is_empty()
    }

    /// Whether the file at `rel` (relative to the input root) is ignored.
    #[must_use]
    pub fn is_ignored(&self, rel: &Path) -> bool {
        if self.is_empty() {
            return false;
        }

        let name = rel
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self
            .basename
            .iter()
            .any(|p| p.matches_with(&name, MATCH_OPTIONS))
        {
            return true;
        }

        let slashed = to_slash(rel);
        self.path
            .iter()
            .any(|p| p.matches_with(&slashed, MATCH_OPTIONS))
    }
}
