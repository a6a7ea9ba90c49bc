//! Built-in templates.

/// Name of the passthrough template.
pub const NONE: &str = "none";

/// Name of the full-page template used when nothing else is requested.
pub const DEFAULT: &str = "default";

/// Emits the rendered content unchanged.
pub const NONE_TEMPLATE: &str = "{{ content }}";

/// Minimal standalone HTML5 page.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{%- if date %}
<meta name="date" content="{{ date }}">
{%- endif %}
<title>{{ title }}</title>
{%- if stylesheet %}
<link rel="stylesheet" href="{{ stylesheet }}">
{%- endif %}
</head>
<body>
<main>
{{ content }}</main>
</body>
</html>
"#;

/// Look up a built-in template by name, returning its canonical name and text.
#[must_use]
pub fn builtin(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        NONE => Some((NONE, NONE_TEMPLATE)),
        DEFAULT => Some((DEFAULT, DEFAULT_TEMPLATE)),
        _ => None,
    }
}
