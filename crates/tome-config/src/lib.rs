//! Configuration management for tome.
//!
//! Parses `tome.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `convert.input`
//! - `convert.output`
//! - `convert.template`
//! - `convert.stylesheet`
//! - `convert.ignore`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
/// Paths given here are taken relative to the working directory, not to the
/// config file.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override input file or directory.
    pub input: Option<PathBuf>,
    /// Override output location.
    pub output: Option<PathBuf>,
    /// Override template identifier.
    pub template: Option<String>,
    /// Override clean-before-convert flag.
    pub clean: Option<bool>,
    /// Override stylesheet destination.
    pub stylesheet: Option<String>,
    /// Override ignore patterns.
    pub ignore: Option<Vec<String>>,
    /// Override watch debounce in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tome.toml";

const DEFAULT_DEBOUNCE_MS: u64 = 100;
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Conversion settings as written in TOML.
    convert: ConvertConfigRaw,
    /// Watch mode configuration.
    pub watch: WatchConfig,

    /// Resolved conversion settings (set after loading).
    #[serde(skip)]
    pub convert_resolved: ConvertConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw conversion configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConvertConfigRaw {
    input: Option<String>,
    output: Option<String>,
    template: Option<String>,
    clean: Option<bool>,
    stylesheet: Option<String>,
    ignore: Option<Vec<String>>,
}

/// Resolved conversion configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Input file or directory.
    pub input: Option<PathBuf>,
    /// Output location. An empty path means standard output.
    pub output: Option<PathBuf>,
    /// Template identifier (built-in name or file path).
    pub template: Option<String>,
    /// Whether to clear the output directory before converting.
    pub clean: bool,
    /// Supplementary stylesheet destination, relative to the output root.
    pub stylesheet: Option<String>,
    /// Glob patterns of source files to skip.
    pub ignore: Vec<String>,
}

/// Watch mode configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a change is processed, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl WatchConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`convert.output`").
        field: String,
        /// Error message (e.g., "${`SITE_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file (relative paths are
    /// taken from `cwd`). Otherwise, searches for `tome.toml` in `cwd` and its
    /// parents, and falls back to defaults when there is none.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the resulting configuration is invalid.
    pub fn load(
        cwd: &Path,
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let path = cwd.join(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            Self::load_from_file(&path)?
        } else if let Some(discovered) = Self::discover_config(cwd) {
            tracing::debug!(path = %discovered.display(), "Discovered config file");
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let convert = &mut self.convert_resolved;
        if let Some(input) = &settings.input {
            convert.input = Some(input.clone());
        }
        if let Some(output) = &settings.output {
            convert.output = Some(output.clone());
        }
        if let Some(template) = &settings.template {
            convert.template = Some(template.clone());
        }
        if let Some(clean) = settings.clean {
            convert.clean = clean;
        }
        if let Some(stylesheet) = &settings.stylesheet {
            convert.stylesheet = Some(stylesheet.clone());
        }
        if let Some(ignore) = &settings.ignore {
            convert.ignore.clone_from(ignore);
        }
        if let Some(debounce_ms) = settings.debounce_ms {
            self.watch.debounce_ms = debounce_ms;
        }
    }

    /// Search for a config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_convert()?;
        self.validate_watch()?;
        Ok(())
    }

    fn validate_convert(&self) -> Result<(), ConfigError> {
        let convert = &self.convert_resolved;
        if let Some(template) = &convert.template {
            require_non_empty(template, "convert.template")?;
        }
        for pattern in &convert.ignore {
            require_non_empty(pattern, "convert.ignore entries")?;
        }
        Ok(())
    }

    fn validate_watch(&self) -> Result<(), ConfigError> {
        let debounce_ms = self.watch.debounce_ms;
        if debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be greater than 0".to_owned(),
            ));
        }
        if debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "watch.debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let convert = &mut self.convert;
        expand::expand_opt(&mut convert.input, "convert.input")?;
        expand::expand_opt(&mut convert.output, "convert.output")?;
        expand::expand_opt(&mut convert.template, "convert.template")?;
        expand::expand_opt(&mut convert.stylesheet, "convert.stylesheet")?;
        if let Some(ignore) = &mut convert.ignore {
            for pattern in ignore.iter_mut() {
                *pattern = expand::expand_env(pattern, "convert.ignore")?;
            }
        }
        Ok(())
    }

    /// Resolve relative paths against the config file's directory.
    ///
    /// An empty `output` is kept empty (standard output). A template is
    /// resolved only when it names a file next to the config, so built-in
    /// names stay untouched.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.convert;
        let resolve = |path: &str| {
            if path.is_empty() {
                PathBuf::new()
            } else {
                config_dir.join(path)
            }
        };

        let template = raw.template.as_ref().map(|template| {
            let candidate = config_dir.join(template);
            if candidate.is_file() {
                candidate.to_string_lossy().into_owned()
            } else {
                template.clone()
            }
        });

        self.convert_resolved = ConvertConfig {
            input: raw.input.as_deref().map(resolve),
            output: raw.output.as_deref().map(resolve),
            template,
            clean: raw.clean.unwrap_or(false),
            stylesheet: raw.stylesheet.clone(),
            ignore: raw.ignore.clone().unwrap_or_default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.convert_resolved, ConvertConfig::default());
        assert_eq!(config.watch.debounce_ms, 100);
        assert_eq!(config.watch.debounce(), Duration::from_millis(100));
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.convert.input.is_none());
        assert_eq!(config.watch.debounce_ms, 100);
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[convert]
input = "docs"
output = "../site"
template = "default"
clean = true
stylesheet = "@/math.css"
ignore = ["drafts/**", "*.tmp"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.convert_resolved,
            ConvertConfig {
                input: Some(PathBuf::from("/project/docs")),
                output: Some(PathBuf::from("/project/../site")),
                template: Some("default".to_owned()),
                clean: true,
                stylesheet: Some("@/math.css".to_owned()),
                ignore: vec!["drafts/**".to_owned(), "*.tmp".to_owned()],
            }
        );
    }

    #[test]
    fn test_resolve_empty_output_stays_empty() {
        let toml = r#"
[convert]
output = ""
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        assert_eq!(config.convert_resolved.output, Some(PathBuf::new()));
    }

    #[test]
    fn test_resolve_template_file_next_to_config() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("page.html"), "{{ content }}").unwrap();
        let toml = r#"
[convert]
template = "page.html"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(temp.path());
        assert_eq!(
            config.convert_resolved.template,
            Some(temp.path().join("page.html").to_string_lossy().into_owned())
        );
    }

    #[test]
    fn test_apply_cli_settings_override_file_values() {
        let toml = r#"
[convert]
input = "docs"
template = "none"
ignore = ["a.md"]

[watch]
debounce_ms = 250
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        config.apply_cli_settings(&CliSettings {
            template: Some("default".to_owned()),
            clean: Some(true),
            ignore: Some(vec!["b.md".to_owned()]),
            debounce_ms: Some(50),
            ..Default::default()
        });

        let convert = &config.convert_resolved;
        assert_eq!(convert.input, Some(PathBuf::from("/project/docs"))); // Unchanged
        assert_eq!(convert.template.as_deref(), Some("default"));
        assert!(convert.clean);
        assert_eq!(convert.ignore, vec!["b.md".to_owned()]);
        assert_eq!(config.watch.debounce_ms, 50);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.convert_resolved, ConvertConfig::default());
        assert_eq!(config.watch.debounce_ms, 100);
    }

    #[test]
    fn test_expand_env_vars_convert() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TOME_TEST_SITE_DIR", "/srv/site");
        }

        let toml = r#"
[convert]
output = "${TOME_TEST_SITE_DIR}/html"
ignore = ["${TOME_TEST_IGNORE_UNSET:-*.tmp}"]
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.convert.output.as_deref(), Some("/srv/site/html"));
        assert_eq!(config.convert.ignore, Some(vec!["*.tmp".to_owned()]));

        unsafe {
            std::env::remove_var("TOME_TEST_SITE_DIR");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("TOME_TEST_MISSING_INPUT");
        }

        let toml = r#"
[convert]
input = "${TOME_TEST_MISSING_INPUT}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("TOME_TEST_MISSING_INPUT"));
        assert!(err.to_string().contains("convert.input"));
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_debounce_zero() {
        let mut config = Config::default();
        config.watch.debounce_ms = 0;
        assert_validation_error(&config, &["watch.debounce_ms", "greater than 0"]);
    }

    #[test]
    fn test_validate_debounce_too_high() {
        let mut config = Config::default();
        config.watch.debounce_ms = 10_001;
        assert_validation_error(&config, &["watch.debounce_ms", "10000"]);
    }

    #[test]
    fn test_validate_empty_ignore_pattern() {
        let mut config = Config::default();
        config.convert_resolved.ignore = vec!["*.tmp".to_owned(), " ".to_owned()];
        assert_validation_error(&config, &["convert.ignore"]);
    }

    #[test]
    fn test_validate_empty_template() {
        let mut config = Config::default();
        config.convert_resolved.template = Some(String::new());
        assert_validation_error(&config, &["convert.template", "cannot be empty"]);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let err = Config::load(temp.path(), Some(Path::new("missing.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_discovers_config_in_parent() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILENAME),
            "[convert]\ninput = \"docs\"\n\n[watch]\ndebounce_ms = 300\n",
        )
        .unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load(&nested, None, None).unwrap();

        assert_eq!(
            config.config_path,
            Some(temp.path().join(CONFIG_FILENAME))
        );
        assert_eq!(
            config.convert_resolved.input,
            Some(temp.path().join("docs"))
        );
        assert_eq!(config.watch.debounce_ms, 300);
    }

    #[test]
    fn test_load_rejects_invalid_cli_override() {
        let temp = tempfile::tempdir().unwrap();
        let settings = CliSettings {
            debounce_ms: Some(0),
            ..Default::default()
        };
        let err = Config::load(temp.path(), None, Some(&settings)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("bad.toml"), "[convert\n").unwrap();
        let err = Config::load(temp.path(), Some(Path::new("bad.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
