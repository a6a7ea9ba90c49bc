//! Colored terminal output utilities.

use console::{Style, Term};
use tome_engine::{ConvertSummary, Reporter};

/// Terminal output formatter.
///
/// Doubles as the engine's [`Reporter`]: progress goes to stderr so that
/// `--stdout` output stays clean.
pub(crate) struct Output {
    term: Term,
    quiet: bool,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            quiet: false,
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Suppress per-file `wrote:` lines.
    #[must_use]
    pub(crate) fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print the end-of-run summary.
    pub(crate) fn summary(&self, summary: &ConvertSummary) {
        self.success(&summary_line(summary));
    }
}

impl Reporter for Output {
    fn wrote(&self, path: &str) {
        if !self.quiet {
            self.info(&format!("wrote: {path}"));
        }
    }

    fn warning(&self, message: &str) {
        Output::warning(self, &format!("warning: {message}"));
    }

    fn watching(&self, location: &str) {
        self.highlight(&format!("watching: {location} (press Ctrl-C to stop)"));
    }
}

fn summary_line(summary: &ConvertSummary) -> String {
    let pages = if summary.rendered == 1 { "page" } else { "pages" };
    let files = if summary.copied == 1 { "file" } else { "files" };
    let mut line = format!(
        "Rendered {} {pages}, copied {} {files}",
        summary.rendered, summary.copied
    );
    if summary.skipped > 0 {
        line.push_str(&format!(", skipped {}", summary.skipped));
    }
    line
}
