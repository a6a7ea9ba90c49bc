//! Anchored paths and root contexts for tome.
//!
//! Every file tome touches is tracked against up to three anchors at once:
//! the input root, the output root, and the process working directory.
//! This crate provides the values that keep those relationships explicit:
//!
//! - [`AnchoredPath`]: immutable path text plus the absolute location it denotes
//! - [`Entry`], [`FileRef`], [`DirRef`]: file/directory refinements with async
//!   filesystem queries
//! - [`RootContext`]: the input/output roots of one conversion, including the
//!   `@/` root-relative marker
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use tome_paths::AnchoredPath;
//!
//! let guide = AnchoredPath::resolve("docs/../docs/guide.md", Path::new("/site"));
//! assert_eq!(guide.absolute(), Path::new("/site/docs/guide.md"));
//! assert_eq!(guide.path_from(Path::new("/site/assets")), Path::new("../docs/guide.md"));
//! ```

mod anchored;
mod entry;
mod normalize;
mod roots;

pub use anchored::AnchoredPath;
pub use entry::{DirRef, Entry, FileRef};
pub use normalize::{normalize, relative, to_slash};
pub use roots::{ROOT_MARKER, RootContext, strip_marker};
