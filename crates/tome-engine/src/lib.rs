//! Conversion engine for tome.
//!
//! Turns a Markdown file into an HTML page, or a directory of Markdown files
//! into a mirrored directory of HTML pages with every other file copied
//! along. References written as `@/path` in the rendered markup are rewritten
//! into relative links that work from each page's final location.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tome_engine::{ConvertOptions, Engine};
//! use tome_render::MarkdownRenderer;
//!
//! # async fn example() -> Result<(), tome_engine::ConvertError> {
//! let cwd = std::env::current_dir()?;
//! let mut engine = Engine::new(cwd, Arc::new(MarkdownRenderer::new()));
//! let summary = engine
//!     .convert(&ConvertOptions::new("docs").with_output("site"))
//!     .await?;
//! println!("{} pages", summary.rendered);
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod ignore;
mod links;
mod options;
mod reporter;

pub use engine::{ConvertSummary, Engine};
pub use error::ConvertError;
pub use ignore::IgnoreSet;
pub use links::{LINK_ATTRIBUTES, rewrite_links};
pub use options::ConvertOptions;
pub use reporter::{RecordingReporter, Reporter, SilentReporter};
