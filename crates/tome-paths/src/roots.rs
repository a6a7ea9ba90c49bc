//! Input/output roots of a single conversion.

use std::path::{Path, PathBuf};

use crate::anchored::AnchoredPath;
use crate::entry::DirRef;

/// Prefix marking a reference as relative to a root rather than to the
/// document that contains it.
pub const ROOT_MARKER: &str = "@/";

/// Strip the root marker from `text`.
///
/// Returns `None` when `text` does not start with [`ROOT_MARKER`]. Slashes
/// following the marker are dropped as well, so `@//x` cannot escape the root.
#[must_use]
pub fn strip_marker(text: &str) -> Option<&str> {
    text.strip_prefix(ROOT_MARKER)
        .map(|rest| rest.trim_start_matches('/'))
}

/// Roots of one conversion run.
///
/// Constructed once per conversion and read-only afterwards. Watch mode
/// replaces the whole value when it has to reconfigure, it never mutates one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootContext {
    cwd: PathBuf,
    input: DirRef,
    output: DirRef,
}

impl RootContext {
    /// Roots for single-file conversion: both collapse to the working directory.
    #[must_use]
    pub fn single_file(cwd: &Path) -> Self {
        let root = DirRef::new(AnchoredPath::from_absolute(cwd));
        Self {
            cwd: cwd.to_path_buf(),
            input: root.clone(),
            output: root,
        }
    }

    /// Roots for whole-tree conversion.
    #[must_use]
    pub fn tree(cwd: &Path, input: DirRef, output: DirRef) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            input,
            output,
        }
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[must_use]
    pub fn input(&self) -> &DirRef {
        &self.input
    }

    #[must_use]
    pub fn output(&self) -> &DirRef {
        &self.output
    }

    /// Resolve `text` against the input root, honoring the `@/` marker.
    #[must_use]
    pub fn resolve_under_input(&self, text: &str) -> AnchoredPath {
        resolve_under(&self.input, text)
    }

    /// Resolve `text` against the output root, honoring the `@/` marker.
    #[must_use]
    pub fn resolve_under_output(&self, text: &str) -> AnchoredPath {
        resolve_under(&self.output, text)
    }

    /// `path` relative to the input root.
    #[must_use]
    pub fn input_relative(&self, path: &AnchoredPath) -> PathBuf {
        path.path_from(self.input.absolute())
    }

    /// `path` relative to the output root.
    #[must_use]
    pub fn output_relative(&self, path: &AnchoredPath) -> PathBuf {
        path.path_from(self.output.absolute())
    }

    /// Display form of `path` for messages.
    #[must_use]
    pub fn display(&self, path: &AnchoredPath) -> String {
        path.location(&self.cwd).display().to_string()
    }
}

fn resolve_under(root: &DirRef, text: &str) -> AnchoredPath {
    let text = text.trim();
    let rel = strip_marker(text).unwrap_or(text);
    AnchoredPath::resolve(rel, root.absolute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> RootContext {
        RootContext::tree(
            Path::new("/w"),
            DirRef::new(AnchoredPath::resolve("input", Path::new("/w"))),
            DirRef::new(AnchoredPath::resolve("output", Path::new("/w"))),
        )
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("@/img/a.png"), Some("img/a.png"));
        assert_eq!(strip_marker("@//etc/passwd"), Some("etc/passwd"));
        assert_eq!(strip_marker("@/"), Some(""));
        assert_eq!(strip_marker("img/a.png"), None);
        assert_eq!(strip_marker("/@/a"), None);
    }

    #[test]
    fn test_single_file_roots_are_cwd() {
        let roots = RootContext::single_file(Path::new("/w"));
        assert_eq!(roots.input().absolute(), Path::new("/w"));
        assert_eq!(roots.output().absolute(), Path::new("/w"));
        assert_eq!(roots.cwd(), Path::new("/w"));
    }

    #[test]
    fn test_resolve_under_input_with_marker() {
        let path = tree().resolve_under_input("@/README.html");
        assert_eq!(path.absolute(), Path::new("/w/input/README.html"));
    }

    #[test]
    fn test_resolve_under_output_with_marker() {
        let path = tree().resolve_under_output("@/css/math.css");
        assert_eq!(path.absolute(), Path::new("/w/output/css/math.css"));
    }

    #[test]
    fn test_resolve_plain_relative_against_root() {
        let roots = tree();
        assert_eq!(
            roots.resolve_under_input("docs/a.md").absolute(),
            Path::new("/w/input/docs/a.md")
        );
        assert_eq!(
            roots.resolve_under_output("a.css").absolute(),
            Path::new("/w/output/a.css")
        );
    }

    #[test]
    fn test_resolve_absolute_without_marker() {
        let path = tree().resolve_under_output("/tmp/a.css");
        assert_eq!(path.absolute(), Path::new("/tmp/a.css"));
    }

    #[test]
    fn test_marker_keeps_double_slash_under_root() {
        let path = tree().resolve_under_input("@//abs.png");
        assert_eq!(path.absolute(), Path::new("/w/input/abs.png"));
    }

    #[test]
    fn test_relative_helpers() {
        let roots = tree();
        let file = AnchoredPath::resolve("/w/input/docs/guide.md", Path::new("/"));
        assert_eq!(roots.input_relative(&file), PathBuf::from("docs/guide.md"));
        assert_eq!(
            roots.output_relative(&file),
            PathBuf::from("../input/docs/guide.md")
        );
        assert_eq!(roots.display(&file), "input/docs/guide.md");
    }
}
