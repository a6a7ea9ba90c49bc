//! Math usage tracking and the supplementary stylesheet derived from it.

/// Which kinds of math notation have been rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MathUsage {
    /// `$...$` spans.
    pub inline: bool,
    /// `$$...$$` blocks.
    pub display: bool,
}

const BASE_RULES: &str = "\
.math {
  font-family: \"Latin Modern Math\", \"STIX Two Math\", \"Cambria Math\", serif;
  font-style: normal;
  white-space: nowrap;
}
";

const INLINE_RULES: &str = "\
.math-inline {
  padding: 0 0.1em;
}
";

const DISPLAY_RULES: &str = "\
.math-display {
  display: block;
  margin: 1em 0;
  overflow-x: auto;
  text-align: center;
}
";

impl MathUsage {
    /// Merge `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        self.inline |= other.inline;
        self.display |= other.display;
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.inline && !self.display
    }

    /// Stylesheet covering the recorded notation, or `None` if nothing was used.
    #[must_use]
    pub fn stylesheet(self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut css = String::from("/* Math styles generated by tome */\n");
        css.push_str(BASE_RULES);
        if self.inline {
            css.push_str(INLINE_RULES);
        }
        if self.display {
            css.push_str(DISPLAY_RULES);
        }
        Some(css)
    }
}
