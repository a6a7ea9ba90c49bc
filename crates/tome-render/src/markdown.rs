//! pulldown-cmark backed renderer.

use std::sync::Mutex;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::math::MathUsage;
use crate::{RenderHints, Rendered, Renderer};

/// Markdown renderer with GFM extensions and math.
///
/// Records which math notation it has rendered so that
/// [`Renderer::stylesheet`] reflects every document rendered since the last
/// [`Renderer::reset`].
pub struct MarkdownRenderer {
    options: Options,
    math: Mutex<MathUsage>,
}

impl MarkdownRenderer {
    /// Create a renderer with GFM and math enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_HEADING_ATTRIBUTES
                | Options::ENABLE_GFM
                | Options::ENABLE_MATH,
            math: Mutex::new(MathUsage::default()),
        }
    }

    /// Current math usage.
    #[must_use]
    pub fn math_usage(&self) -> MathUsage {
        *self.math.lock().unwrap()
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, text: &str, hints: &RenderHints<'_>) -> Rendered {
        let events: Vec<Event<'_>> = Parser::new_ext(text, self.options).collect();

        let title = extract_title(&events);
        let usage = scan_math(&events);
        if !usage.is_empty() {
            self.math.lock().unwrap().merge(usage);
            tracing::debug!(
                source = ?hints.source,
                inline = usage.inline,
                display = usage.display,
                "Rendered math"
            );
        }

        let mut html = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut html, events.into_iter());

        Rendered { html, title }
    }

    fn stylesheet(&self) -> Option<String> {
        self.math_usage().stylesheet()
    }

    fn reset(&self) {
        *self.math.lock().unwrap() = MathUsage::default();
    }
}

/// Plain text of the first H1 heading.
fn extract_title(events: &[Event<'_>]) -> Option<String> {
    let start = events.iter().position(|e| {
        matches!(
            e,
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            })
        )
    })?;

    let mut title = String::new();
    for event in &events[start + 1..] {
        match event {
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => break,
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                title.push_str(text);
            }
            Event::SoftBreak | Event::HardBreak => title.push(' '),
            _ => {}
        }
    }

    let title = title.trim();
    (!title.is_empty()).then(|| title.to_owned())
}

fn scan_math(events: &[Event<'_>]) -> MathUsage {
    let mut usage = MathUsage::default();
    for event in events {
        match event {
            Event::InlineMath(_) => usage.inline = true,
            Event::DisplayMath(_) => usage.display = true,
            _ => {}
        }
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(text: &str) -> Rendered {
        MarkdownRenderer::new().render(text, &RenderHints::default())
    }

    #[test]
    fn test_render_paragraph() {
        assert_eq!(render("This is file").html, "<p>This is file</p>\n");
    }

    #[test]
    fn test_render_keeps_root_marker_links() {
        let html = render("[readme](@/README.html)").html;
        assert_eq!(html, "<p><a href=\"@/README.html\">readme</a></p>\n");
    }

    #[test]
    fn test_title_from_first_h1() {
        let rendered = render("intro\n\n# First `code`\n\n# Second\n");
        assert_eq!(rendered.title.as_deref(), Some("First code"));
    }

    #[test]
    fn test_no_title_without_h1() {
        assert!(render("## Only h2\n\ntext").title.is_none());
    }

    #[test]
    fn test_gfm_table() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n").html;
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_math_usage_accumulates_and_resets() {
        let renderer = MarkdownRenderer::new();
        renderer.render("no math here", &RenderHints::default());
        assert!(renderer.stylesheet().is_none());

        let rendered = renderer.render("Euler: $e^{i\\pi} = -1$", &RenderHints::default());
        assert!(rendered.html.contains("math-inline"));
        let inline_only = renderer.stylesheet().unwrap();

        renderer.render("$$x^2$$", &RenderHints::default());
        let with_display = renderer.stylesheet().unwrap();
        assert_ne!(inline_only, with_display);
        assert_eq!(
            renderer.math_usage(),
            MathUsage {
                inline: true,
                display: true
            }
        );

        renderer.reset();
        assert!(renderer.stylesheet().is_none());
    }
}
