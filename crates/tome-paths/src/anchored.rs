//! Immutable path values anchored to an absolute location.

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::normalize::{normalize, relative};

/// A path as the user wrote it, together with the absolute location it denotes.
///
/// `raw` keeps the trimmed original text (relative, absolute, or carrying a
/// root marker) for diagnostics and for rebasing. `absolute` is always an
/// absolute, lexically normalized path. Everything else is derived from these
/// two fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnchoredPath {
    raw: String,
    absolute: PathBuf,
}

impl AnchoredPath {
    /// Resolve `text` against `anchor`.
    ///
    /// Absolute text replaces the anchor. Empty text resolves to the anchor
    /// itself. `anchor` must be absolute.
    #[must_use]
    pub fn resolve(text: &str, anchor: &Path) -> Self {
        Self::resolve_path(Path::new(text.trim()), anchor)
    }

    /// Resolve a [`Path`] against `anchor`, keeping its lossy text as `raw`.
    #[must_use]
    pub fn resolve_path(path: &Path, anchor: &Path) -> Self {
        debug_assert!(
            anchor.is_absolute(),
            "anchor must be absolute: {}",
            anchor.display()
        );
        Self {
            raw: path.to_string_lossy().into_owned(),
            absolute: normalize(&anchor.join(path)),
        }
    }

    /// Resolve `text` against the process working directory.
    pub fn resolve_cwd(text: &str) -> io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::resolve(text, &cwd))
    }

    /// Wrap an already absolute path.
    #[must_use]
    pub fn from_absolute(path: &Path) -> Self {
        Self::resolve_path(path, path)
    }

    /// Path text as originally supplied (trimmed).
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Absolute, normalized location.
    #[must_use]
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Whether the original text was itself an absolute path.
    #[must_use]
    pub fn is_raw_absolute(&self) -> bool {
        Path::new(&self.raw).is_absolute()
    }

    /// Relative path from `anchor` to this location.
    ///
    /// The result may start with any number of `..` segments. If `anchor` and
    /// this path share no root at all the absolute path is returned.
    #[must_use]
    pub fn path_from(&self, anchor: &Path) -> PathBuf {
        relative(&normalize(anchor), &self.absolute)
    }

    /// Whether this location lies outside `anchor`.
    #[must_use]
    pub fn is_outside(&self, anchor: &Path) -> bool {
        let rel = self.path_from(anchor);
        rel.is_absolute() || matches!(rel.components().next(), Some(Component::ParentDir))
    }

    /// Human-readable location relative to `cwd`.
    ///
    /// Falls back to the absolute form for paths outside `cwd` instead of a
    /// long chain of `..` segments. Only meant for logs and messages.
    #[must_use]
    pub fn location(&self, cwd: &Path) -> PathBuf {
        if self.is_outside(cwd) {
            return self.absolute.clone();
        }
        let rel = self.path_from(cwd);
        if rel.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            rel
        }
    }

    /// Rebase onto `anchor`.
    ///
    /// The new `raw` is this location expressed relative to `anchor`, so a
    /// rebased value can itself be rebased again and still point at the same
    /// place.
    #[must_use]
    pub fn chdir(&self, anchor: &Path) -> Self {
        let rel = self.path_from(anchor);
        Self::resolve_path(&rel, &normalize(anchor))
    }

    /// Resolve `child` against this location.
    #[must_use]
    pub fn join(&self, child: &Path) -> Self {
        Self {
            raw: Path::new(&self.raw).join(child).to_string_lossy().into_owned(),
            absolute: normalize(&self.absolute.join(child)),
        }
    }

    /// Containing directory, or `None` at the filesystem root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.absolute.parent().map(Self::from_absolute)
    }
}

impl fmt::Display for AnchoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.absolute.display())
    }
}
