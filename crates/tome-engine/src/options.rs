//! Conversion options.

/// What to convert and where to.
///
/// Paths are taken as written; relative ones resolve against the engine's
/// working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Source file or directory.
    pub input: String,
    /// Destination.
    ///
    /// `None` picks a default next to the input. `Some("")` writes a single
    /// rendered document to standard output.
    pub output: Option<String>,
    /// Template identifier: a built-in name or a template file path.
    /// `None` means the `default` built-in.
    pub template: Option<String>,
    /// Remove the output directory's contents before a tree pass.
    pub clean: bool,
    /// Write a single-file conversion to standard output.
    pub stdout: bool,
    /// Destination of the supplementary stylesheet, resolved under the
    /// output root (`@/math.css`).
    pub stylesheet: Option<String>,
    /// Glob patterns of source files to skip.
    pub ignore: Vec<String>,
}

impl ConvertOptions {
    /// Options converting `input` with every other setting at its default.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use]
    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    #[must_use]
    pub fn with_stylesheet(mut self, stylesheet: impl Into<String>) -> Self {
        self.stylesheet = Some(stylesheet.into());
        self
    }

    #[must_use]
    pub fn with_ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = patterns.into_iter().map(Into::into).collect();
        self
    }
}
