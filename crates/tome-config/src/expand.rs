//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// Bare `$VAR` is left alone; only the braced form is expanded. `field` names
/// the configuration key for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(text) = value.as_deref() {
        *value = Some(expand_env(text, field)?);
    }
    Ok(())
}

struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TOME_TEST_EXPAND_SIMPLE", "docs");
        }
        let result = expand_env("${TOME_TEST_EXPAND_SIMPLE}", "convert.input").unwrap();
        assert_eq!(result, "docs");
        unsafe {
            std::env::remove_var("TOME_TEST_EXPAND_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("TOME_TEST_EXPAND_UNSET");
        }
        let result = expand_env("${TOME_TEST_EXPAND_UNSET:-site}", "convert.output").unwrap();
        assert_eq!(result, "site");
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("TOME_TEST_EXPAND_ROOT", "/srv/www");
        }
        let result = expand_env("${TOME_TEST_EXPAND_ROOT}/docs", "convert.output").unwrap();
        assert_eq!(result, "/srv/www/docs");
        unsafe {
            std::env::remove_var("TOME_TEST_EXPAND_ROOT");
        }
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("TOME_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${TOME_TEST_EXPAND_MISSING}", "convert.template").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("TOME_TEST_EXPAND_MISSING"));
        assert!(err.to_string().contains("convert.template"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(expand_env("$HOME/x", "convert.input").unwrap(), "$HOME/x");
    }

    #[test]
    fn test_expand_opt_none_is_noop() {
        let mut value = None;
        expand_opt(&mut value, "convert.stylesheet").unwrap();
        assert_eq!(value, None);
    }
}
