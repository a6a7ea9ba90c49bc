//! `tome` convert and watch implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tome_config::{CliSettings, Config};
use tome_engine::{ConvertOptions, Engine};
use tome_render::MarkdownRenderer;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for a conversion.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct ConvertArgs {
    /// Markdown file or directory to convert (overrides config).
    input: Option<PathBuf>,

    /// Output file or directory; an empty value writes to stdout (overrides config).
    output: Option<String>,

    /// Template: `default`, `none`, or a template file path (overrides config).
    #[arg(short, long)]
    template: Option<String>,

    /// Keep converting as the sources change, until Ctrl-C.
    #[arg(short, long)]
    watch: bool,

    /// Empty the output directory before converting.
    #[arg(long)]
    clean: bool,

    /// Do not print a line per written file.
    #[arg(short, long)]
    quiet: bool,

    /// Write a single converted file to standard output.
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Where to write the math stylesheet, e.g. `@/math.css` (overrides config).
    #[arg(long, value_name = "PATH")]
    stylesheet: Option<String>,

    /// Glob pattern of source files to skip (repeatable, overrides config).
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Path to configuration file (default: auto-discover tome.toml).
    #[arg(short, long, env = "TOME_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (timing and per-file logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertArgs {
    /// Execute the conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the conversion fails.
    pub(crate) async fn execute(self, cwd: &Path) -> Result<(), CliError> {
        let output = Arc::new(Output::new().quiet(self.quiet));
        let watch = self.watch;
        let stdout = self.stdout;

        let config = Config::load(cwd, self.config.as_deref(), Some(&self.cli_settings()))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Using config file");
        }
        let options = convert_options(&config, stdout);

        let shared: Arc<Output> = Arc::clone(&output);
        let mut engine = Engine::new(cwd, Arc::new(MarkdownRenderer::new())).with_reporter(shared);

        if watch {
            engine.watch(&options, config.watch.debounce()).await?;
            output.info("Stopped watching");
        } else {
            let summary = engine.convert(&options).await?;
            if !self.quiet {
                output.summary(&summary);
            }
        }
        Ok(())
    }

    /// Build CLI settings from args.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            input: self.input.clone(),
            output: self.output.as_deref().map(PathBuf::from),
            template: self.template.clone(),
            clean: self.clean.then_some(true),
            stylesheet: self.stylesheet.clone(),
            ignore: (!self.ignore.is_empty()).then(|| self.ignore.clone()),
            debounce_ms: None,
        }
    }
}

/// Translate resolved configuration into engine options.
fn convert_options(config: &Config, stdout: bool) -> ConvertOptions {
    let convert = &config.convert_resolved;
    let path_text = |path: &PathBuf| path.to_string_lossy().into_owned();

    ConvertOptions {
        input: convert.input.as_ref().map(path_text).unwrap_or_default(),
        output: convert.output.as_ref().map(path_text),
        template: convert.template.clone(),
        clean: convert.clean,
        stdout,
        stylesheet: convert.stylesheet.clone(),
        ignore: convert.ignore.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ConvertArgs,
    }

    fn parse(args: &[&str]) -> ConvertArgs {
        TestCli::try_parse_from(std::iter::once("tome").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_positional_input_and_output() {
        let args = parse(&["docs", "site", "-t", "none", "--clean"]);
        let settings = args.cli_settings();
        assert_eq!(settings.input, Some(PathBuf::from("docs")));
        assert_eq!(settings.output, Some(PathBuf::from("site")));
        assert_eq!(settings.template.as_deref(), Some("none"));
        assert_eq!(settings.clean, Some(true));
        assert_eq!(settings.ignore, None);
    }

    #[test]
    fn test_empty_output_is_accepted() {
        let settings = parse(&["file.md", ""]).cli_settings();
        assert_eq!(settings.output, Some(PathBuf::new()));
    }

    #[test]
    fn test_repeated_ignore_patterns() {
        let args = parse(&["docs", "-i", "drafts/**", "--ignore", "*.tmp"]);
        assert_eq!(
            args.cli_settings().ignore,
            Some(vec!["drafts/**".to_owned(), "*.tmp".to_owned()])
        );
    }

    #[test]
    fn test_unset_flags_do_not_override_config() {
        let settings = parse(&[]).cli_settings();
        assert!(settings.input.is_none());
        assert!(settings.clean.is_none());
        assert!(settings.stylesheet.is_none());
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        let result =
            TestCli::try_parse_from(["tome", "file.md", "out.html", "--stdout"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_options_from_config() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join("tome.toml"),
            "[convert]\ninput = \"docs\"\nstylesheet = \"@/math.css\"\n",
        )
        .unwrap();
        let settings = parse(&["-t", "none"]).cli_settings();

        let config = Config::load(temp.path(), None, Some(&settings)).unwrap();
        let options = convert_options(&config, false);

        assert_eq!(
            options,
            ConvertOptions {
                input: temp.path().join("docs").to_string_lossy().into_owned(),
                output: None,
                template: Some("none".to_owned()),
                clean: false,
                stdout: false,
                stylesheet: Some("@/math.css".to_owned()),
                ignore: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_execute_converts_single_file() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("file.md"), "This is file").unwrap();

        parse(&["file.md", "-q", "-t", "none"])
            .execute(temp.path())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("file.html")).unwrap(),
            "<p>This is file</p>\n"
        );
    }

    #[tokio::test]
    async fn test_execute_reports_missing_input() {
        let temp = tempfile::tempdir().unwrap();
        let err = parse(&["missing.md", "-q"])
            .execute(temp.path())
            .await
            .unwrap_err();
        assert!(err.is_user_error());
    }
}
