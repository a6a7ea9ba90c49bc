//! Conversion error types.

use std::path::PathBuf;

use tome_template::TemplateError;
use tome_watch::WatchError;

/// Error returned by [`Engine`](crate::Engine) operations.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Invalid arguments, detected before anything is written.
    #[error("{0}")]
    Validation(String),

    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("Conversion task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ConvertError {
    /// Whether the error is caused by how the tool was invoked rather than by
    /// an unexpected failure. User errors are reported as a single line.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InputNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_user_errors() {
        assert!(ConvertError::Validation("bad".to_owned()).is_user_error());
        assert!(ConvertError::InputNotFound(PathBuf::from("x.md")).is_user_error());
        assert!(!ConvertError::Io(std::io::Error::other("disk")).is_user_error());
    }

    #[test]
    fn test_input_not_found_message() {
        let err = ConvertError::InputNotFound(PathBuf::from("docs/missing.md"));
        assert_eq!(err.to_string(), "Input not found: docs/missing.md");
    }
}
