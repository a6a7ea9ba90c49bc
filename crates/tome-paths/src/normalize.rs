//! Lexical path arithmetic.
//!
//! Nothing here touches the filesystem: symlinks are not resolved, so results
//! match what a user typed rather than where the links happen to point.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically.
///
/// Removes `.` segments and folds `..` into the preceding normal segment.
/// `..` directly below the root is dropped; leading `..` segments of a
/// relative path are kept. A relative path that normalizes to nothing
/// becomes the empty path.
///
/// ```
/// use std::path::Path;
/// use tome_paths::normalize;
///
/// assert_eq!(normalize(Path::new("/a/./b/../c")), Path::new("/a/c"));
/// assert_eq!(normalize(Path::new("../x/../y")), Path::new("../y"));
/// assert_eq!(normalize(Path::new("/..")), Path::new("/"));
/// ```
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => out.push(".."),
            },
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Compute the relative path leading from `from` to `to`.
///
/// Both paths are expected to be absolute and normalized. Equal paths yield
/// the empty path. When the paths do not even share a root (different drive
/// prefixes on Windows) `to` is returned unchanged.
///
/// ```
/// use std::path::Path;
/// use tome_paths::relative;
///
/// assert_eq!(relative(Path::new("/a/b"), Path::new("/a/c/d")), Path::new("../c/d"));
/// assert_eq!(relative(Path::new("/a"), Path::new("/a")), Path::new(""));
/// ```
#[must_use]
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    if from.first() != to.first() {
        return to.iter().collect();
    }

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }
    rel
}

/// Render a path with `/` separators regardless of the host convention.
///
/// Intended for relative paths that end up inside generated markup.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
