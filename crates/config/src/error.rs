use std::path::PathBuf;

/// Crate-wide result type for settings operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the settings store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No configuration file exists yet.
    #[error("notification configuration not found at {}", path.display())]
    NotConfigured { path: PathBuf },

    /// The per-user configuration directory cannot be resolved.
    #[error("resolve user config dir: {message}")]
    Environment { message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not have the expected shape.
    #[error("{context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode config: {0}")]
    Encode(#[source] serde_json::Error),

    /// A method entry is malformed or incomplete.
    #[error("{message}")]
    Validation { message: String },
}

impl Error {
    #[must_use]
    pub fn validation(message: impl std::fmt::Display) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// Prefix a validation message with the position of the offending method.
    #[must_use]
    pub fn at_method(self, index: usize) -> Self {
        match self {
            Self::Validation { message } => Self::Validation {
                message: format!("validate method[{index}]: {message}"),
            },
            other => other,
        }
    }

    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
