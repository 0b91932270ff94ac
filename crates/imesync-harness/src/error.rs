#![forbid(unsafe_code)]

use std::io;

use imesync_edit::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors from reading or writing transcripts.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: invalid record: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("transcript has no header record")]
    MissingHeader,

    #[error("unsupported transcript schema: {0}")]
    UnsupportedSchema(String),

    #[error("line {line}: unexpected {record} record")]
    UnexpectedRecord { line: usize, record: &'static str },

    #[error(
        "summary mismatch: recorded {expected_steps} steps / {expected_notifications} notifications, found {actual_steps} / {actual_notifications}"
    )]
    SummaryMismatch {
        expected_steps: u64,
        expected_notifications: u64,
        actual_steps: u64,
        actual_notifications: u64,
    },
}

/// Errors surfaced by the replay tool.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid events file: {0}")]
    Events(#[source] serde_json::Error),

    #[error("failed to encode report: {0}")]
    Report(#[source] serde_json::Error),

    #[error("replay of {session} diverged at step {seq}")]
    Diverged { session: String, seq: usize },
}

impl HarnessError {
    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Diverged { .. } => 1,
            Self::Transcript(TranscriptError::Io(_) | TranscriptError::Encode(_))
            | Self::Config(ConfigError::Io(_))
            | Self::Io(_)
            | Self::Report(_) => 3,
            Self::Transcript(_) | Self::Config(_) | Self::Events(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_divergence_from_bad_input() {
        let diverged = HarnessError::Diverged {
            session: "s".to_owned(),
            seq: 3,
        };
        assert_eq!(diverged.exit_code(), 1);
        assert_eq!(diverged.to_string(), "replay of s diverged at step 3");

        let missing = HarnessError::from(TranscriptError::MissingHeader);
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(missing.to_string(), "transcript has no header record");
    }

    #[test]
    fn io_failures_share_one_exit_code() {
        let not_found = || io::Error::new(io::ErrorKind::NotFound, "gone");
        let errors = [
            HarnessError::Io(not_found()),
            HarnessError::from(TranscriptError::Io(not_found())),
            HarnessError::from(ConfigError::Io(not_found())),
        ];
        for err in &errors {
            assert_eq!(err.exit_code(), 3, "{err}");
        }

        let invalid = HarnessError::from(ConfigError::Validation(vec!["bad".to_owned()]));
        assert_eq!(invalid.exit_code(), 2);
    }
}
