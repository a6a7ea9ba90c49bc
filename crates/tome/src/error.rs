//! CLI error types.

use std::error::Error as _;

use tome_config::ConfigError;
use tome_engine::ConvertError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the user can fix this by changing arguments or files.
    pub(crate) fn is_user_error(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Convert(err) => err.is_user_error(),
            Self::Io(_) => false,
        }
    }

    /// Messages of every underlying cause, outermost first.
    pub(crate) fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut source = match self {
            Self::Config(err) => err.source(),
            Self::Convert(err) => err.source(),
            Self::Io(err) => err.source(),
        };
        while let Some(err) = source {
            causes.push(err.to_string());
            source = err.source();
        }
        causes
    }
}
