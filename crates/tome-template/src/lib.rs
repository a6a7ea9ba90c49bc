//! Page templates for tome.
//!
//! A template wraps a rendered HTML fragment into a full output document.
//! Placeholders use minijinja syntax; the variables available are `title`,
//! `content`, `date` and `stylesheet` (see [`TemplateVars`]).
//!
//! Templates are identified by a string that is either a built-in name
//! ([`NONE`], [`DEFAULT`]) or a path to a template file.

mod builtin;
mod cache;

use std::path::{Path, PathBuf};

use minijinja::{Environment, context};

pub use builtin::{DEFAULT, DEFAULT_TEMPLATE, NONE, NONE_TEMPLATE, builtin};
pub use cache::{LoadedTemplate, TemplateCache};

/// Error returned when a template fails to render.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// Where a template identifier points to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSource {
    /// Built-in template with the given name.
    Builtin(&'static str),
    /// Template file (absolute path).
    File(PathBuf),
}

impl TemplateSource {
    /// Resolve a template identifier.
    ///
    /// Built-in names win over files. Otherwise `id` is taken as a path,
    /// absolute or relative to `cwd`, and must name an existing file.
    #[must_use]
    pub fn resolve(id: &str, cwd: &Path) -> Option<Self> {
        if let Some((name, _)) = builtin(id) {
            return Some(Self::Builtin(name));
        }
        let path = cwd.join(id);
        path.is_file().then_some(Self::File(path))
    }

    /// Template file path, if this is not a built-in.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Builtin(_) => None,
            Self::File(path) => Some(path),
        }
    }
}

/// Values substituted into a template.
#[derive(Clone, Debug, Default)]
pub struct TemplateVars<'a> {
    /// Document title, already HTML-escaped.
    pub title: &'a str,
    /// Rendered HTML fragment, inserted verbatim.
    pub content: &'a str,
    /// Source modification date (`YYYY-MM-DD`).
    pub date: &'a str,
    /// Relative link to the supplementary stylesheet, empty if there is none.
    pub stylesheet: &'a str,
}

/// Substitute `vars` into `template`.
///
/// Unknown placeholders render as empty strings. No escaping is applied;
/// callers pass already escaped values.
pub fn fill_template(template: &str, vars: &TemplateVars<'_>) -> Result<String, TemplateError> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    let rendered = env.render_str(
        template,
        context! {
            title => vars.title,
            content => vars.content,
            date => vars.date,
            stylesheet => vars.stylesheet,
        },
    )?;
    Ok(rendered)
}
