//! Root-relative link rewriting.
//!
//! Rendered markup may reference other documents and assets with the `@/`
//! marker (`<img src="@/img/logo.png">`). Once the document's final location
//! is known these references are turned into ordinary relative links.
//! Only marked values are touched; everything else passes through verbatim.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tome_paths::{RootContext, strip_marker, to_slash};

/// Attributes whose values may carry a root-relative reference.
pub const LINK_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "poster",
    "cite",
    "data",
    "manifest",
    "srcset",
    "imgsrcset",
    "ping",
    "content",
    "usemap",
];

/// `name="value"` or `name='value'` for a known attribute preceded by
/// whitespace. Groups: 1 prefix up to and including the opening quote,
/// 2 attribute name, 3/4 double/single-quoted value.
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names = LINK_ATTRIBUTES.join("|");
    Regex::new(&format!(
        r#"(?i)(\s({names})\s*=\s*)(?:"([^"]*)"|'([^']*)')"#
    ))
    .unwrap()
});

/// Rewrite every marked reference in `html`.
///
/// `doc_dir` is the directory of the document being produced, expressed in
/// input-root coordinates: the input root joined with the document's
/// output-relative directory. Links computed from there stay valid once the
/// document lands under the output root, because the output tree mirrors the
/// input tree.
///
/// Returns the input unchanged (borrowed) when nothing was rewritten.
#[must_use]
pub fn rewrite_links<'a>(html: &'a str, roots: &RootContext, doc_dir: &Path) -> Cow<'a, str> {
    let mut changed = false;

    let result = ATTRIBUTE_RE.replace_all(html, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let name = &caps[2];
        let (value, quote) = match (caps.get(3), caps.get(4)) {
            (Some(v), _) => (v.as_str(), '"'),
            (None, Some(v)) => (v.as_str(), '\''),
            (None, None) => return whole.to_owned(),
        };

        let rewritten = if name.eq_ignore_ascii_case("srcset") {
            rewrite_srcset(value, roots, doc_dir)
        } else {
            rewrite_value(value, roots, doc_dir)
        };

        match rewritten {
            Some(value) => {
                changed = true;
                let prefix = &caps[1];
                format!("{prefix}{quote}{value}{quote}")
            }
            None => whole.to_owned(),
        }
    });

    if changed { result } else { Cow::Borrowed(html) }
}

/// Rewrite a single marked value, or `None` if it carries no marker.
fn rewrite_value(value: &str, roots: &RootContext, doc_dir: &Path) -> Option<String> {
    let rest = strip_marker(value)?;
    let target = roots.resolve_under_input(value);

    let mut link = to_slash(&target.path_from(doc_dir));
    if link.is_empty() {
        link.push_str("./");
    } else if rest.ends_with('/') && !link.ends_with('/') {
        link.push('/');
    }
    Some(link)
}

/// Rewrite the URL of each marked candidate in a `srcset` list.
///
/// Separators, surrounding whitespace and descriptors (`2x`, `480w`) are kept
/// as they were.
fn rewrite_srcset(value: &str, roots: &RootContext, doc_dir: &Path) -> Option<String> {
    let mut changed = false;

    let candidates: Vec<Cow<'_, str>> = value
        .split(',')
        .map(|candidate| {
            let trimmed = candidate.trim_start();
            let lead = &candidate[..candidate.len() - trimmed.len()];
            let url_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            let (url, descriptor) = trimmed.split_at(url_end);

            match rewrite_value(url, roots, doc_dir) {
                Some(url) => {
                    changed = true;
                    Cow::Owned(format!("{lead}{url}{descriptor}"))
                }
                None => Cow::Borrowed(candidate),
            }
        })
        .collect();

    changed.then(|| candidates.join(","))
}
