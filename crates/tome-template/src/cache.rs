//! Lazily filled template cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builtin::{DEFAULT_TEMPLATE, builtin};
use crate::TemplateSource;

/// Template text returned by [`TemplateCache::load`].
#[derive(Clone, Debug)]
pub struct LoadedTemplate {
    pub text: Arc<str>,
    /// Set when the identifier could not be loaded and the default template
    /// was substituted.
    pub warning: Option<String>,
}

/// Maps template identifiers to their loaded text.
///
/// Entries are filled on first use and dropped with
/// [`invalidate`](Self::invalidate) when the underlying file changes.
pub struct TemplateCache {
    cwd: PathBuf,
    entries: HashMap<String, Arc<str>>,
}

impl TemplateCache {
    /// Create an empty cache resolving file identifiers against `cwd`.
    #[must_use]
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            entries: HashMap::new(),
        }
    }

    /// Template text for `id`.
    ///
    /// Falls back to the default template, with a warning, when `id` names
    /// neither a built-in nor a readable file. Fallbacks are not cached so the
    /// next call retries the file.
    pub fn load(&mut self, id: &str) -> LoadedTemplate {
        if let Some(text) = self.entries.get(id) {
            return LoadedTemplate {
                text: Arc::clone(text),
                warning: None,
            };
        }

        let loaded = match TemplateSource::resolve(id, &self.cwd) {
            Some(TemplateSource::Builtin(name)) => builtin(name)
                .map(|(_, text)| Ok(Arc::<str>::from(text)))
                .unwrap_or_else(|| Err(format!("unknown built-in template {name:?}"))),
            Some(TemplateSource::File(path)) => std::fs::read_to_string(&path)
                .map(Arc::<str>::from)
                .map_err(|e| format!("cannot read template {}: {e}", path.display())),
            None => Err(format!("template {id:?} not found")),
        };

        match loaded {
            Ok(text) => {
                tracing::debug!(template = id, "Loaded template");
                self.entries.insert(id.to_owned(), Arc::clone(&text));
                LoadedTemplate {
                    text,
                    warning: None,
                }
            }
            Err(reason) => {
                let warning = format!("{reason}, using the default template");
                tracing::warn!(template = id, "{warning}");
                LoadedTemplate {
                    text: Arc::from(DEFAULT_TEMPLATE),
                    warning: Some(warning),
                }
            }
        }
    }

    /// Drop the cached entry for `id`. Returns whether one existed.
    pub fn invalidate(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}
