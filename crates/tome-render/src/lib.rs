//! Markdown rendering for tome.
//!
//! The conversion engine only sees the [`Renderer`] trait: markdown text in,
//! HTML fragment out, plus an optional supplementary stylesheet describing
//! the math notation rendered so far.
//!
//! [`MarkdownRenderer`] is the default implementation, built on
//! pulldown-cmark with GFM extensions and math enabled.
//!
//! # Example
//!
//! ```
//! use tome_render::{MarkdownRenderer, RenderHints, Renderer};
//!
//! let renderer = MarkdownRenderer::new();
//! let rendered = renderer.render("# Hello\n\nThis is file", &RenderHints::default());
//! assert_eq!(rendered.title.as_deref(), Some("Hello"));
//! assert!(renderer.stylesheet().is_none());
//! ```

mod escape;
mod markdown;
mod math;

use std::path::Path;

pub use escape::escape_html;
pub use markdown::MarkdownRenderer;
pub use math::MathUsage;

/// Per-call context passed to a renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderHints<'a> {
    /// Source file being rendered, for diagnostics.
    pub source: Option<&'a Path>,
}

/// Output of rendering one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    /// HTML fragment.
    pub html: String,
    /// Text of the first H1 heading, if any.
    pub title: Option<String>,
}

/// Renders document text into HTML.
///
/// Implementations are shared across concurrently running transforms, so
/// any state they keep (such as the math usage behind
/// [`stylesheet`](Self::stylesheet)) needs interior synchronization.
pub trait Renderer: Send + Sync {
    /// Render `text` to an HTML fragment.
    fn render(&self, text: &str, hints: &RenderHints<'_>) -> Rendered;

    /// Current supplementary stylesheet, or `None` if nothing rendered so far
    /// needs one.
    fn stylesheet(&self) -> Option<String>;

    /// Forget everything that influences [`stylesheet`](Self::stylesheet).
    fn reset(&self) {}
}
