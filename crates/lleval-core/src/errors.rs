//! Error types for dataset loading, prompt building and judge calls.

use std::path::PathBuf;

/// Evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Missing or invalid configuration.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem failure.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON or YAML document could not be decoded.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A sample index whose label is not a knowledge-seeking turn.
    #[error("sample {index} has target=false; pick a sample with a knowledge-seeking turn")]
    NonTargetSample { index: usize },

    /// A sample index outside the dataset.
    #[error("sample {index} out of range (dataset has {len} samples)")]
    SampleOutOfRange { index: usize, len: usize },

    /// A knowledge reference that is not present in knowledge.json.
    #[error("knowledge entry not found: {reference}")]
    MissingKnowledge { reference: String },

    /// A dimension that is not defined in the dimension file.
    #[error("unknown dimension '{name}' (available: {available})")]
    UnknownDimension { name: String, available: String },

    /// Template placeholders could not be filled.
    #[error("template error: {message}")]
    Template { message: String },

    /// Transport failure talking to the judge endpoint.
    #[error("network error: {message}")]
    Network { message: String },

    /// The judge endpoint answered with a non-success status.
    #[error("provider '{provider}' returned status {status}: {body}")]
    Provider {
        provider: String,
        status: u16,
        body: String,
    },

    /// The judge endpoint answered with an unexpected body.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// A scorer task was cancelled or panicked.
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Parallel input lists of different lengths.
    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } | Self::Provider { .. } | Self::InvalidResponse { .. } => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        assert_eq!(EvalError::config("missing url").exit_code(), 2);
        let err = EvalError::Network {
            message: "refused".into(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn internal_errors_are_not_judge_failures() {
        let err = EvalError::Internal {
            message: "judge task failed: task 3 panicked".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("internal error:"));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = EvalError::io(
            "/data/val/labels.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("/data/val/labels.json"));
    }
}
