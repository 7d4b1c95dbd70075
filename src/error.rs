//! Error types shared by the inference engine and its collaborators.
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    // ————————————————————————————————————————————————————————————————————————
    // CLASSIFICATION
    // ————————————————————————————————————————————————————————————————————————
    /// A value outside the supported document model. Always fatal.
    #[error("cannot determine type for {kind} value at {path}")]
    Unclassifiable { kind: &'static str, path: String },

    // ————————————————————————————————————————————————————————————————————————
    // RECORD SUPPLY
    // ————————————————————————————————————————————————————————————————————————
    #[error("failed to read {}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse JSON in {}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("invalid extended JSON at {path}: {message}")]
    ExtendedJson { path: String, message: String },

    #[error("record #{index} in {} is not a document (found {found})", path.display())]
    NotADocument { path: PathBuf, index: u64, found: &'static str },

    #[error("no input files for target `{0}`")]
    NoInput(String),

    #[error("bad input pattern: {0}")]
    Glob(String),

    #[error("jq: {0}")]
    Jq(String),

    // ————————————————————————————————————————————————————————————————————————
    // CONFIGURATION
    // ————————————————————————————————————————————————————————————————————————
    #[error("config error: {0}")]
    Config(String),

    // ————————————————————————————————————————————————————————————————————————
    // RUN SUMMARY
    // ————————————————————————————————————————————————————————————————————————
    #[error("{0}")]
    Targets(TargetFailures),
}

/// One target that could not be inferred when the run continues past failures.
#[derive(Debug)]
pub struct TargetFailure {
    pub target: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct TargetFailures(pub Vec<TargetFailure>);

impl fmt::Display for TargetFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} target(s) failed:", self.0.len())?;
        for failure in &self.0 {
            write!(f, "\n  {}: {}", failure.target, failure.error)?;
            let mut cause = std::error::Error::source(&failure.error);
            while let Some(e) = cause {
                write!(f, ": {e}")?;
                cause = std::error::Error::source(e);
            }
        }
        Ok(())
    }
}

impl From<glob::PatternError> for Error {
    fn from(error: glob::PatternError) -> Self {
        Error::Glob(error.to_string())
    }
}

impl From<glob::GlobError> for Error {
    fn from(error: glob::GlobError) -> Self {
        Error::Glob(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_summary_lists_every_failure() {
        let error = Error::Targets(TargetFailures(vec![
            TargetFailure {
                target: "users".into(),
                error: Error::NoInput("users".into()),
            },
            TargetFailure {
                target: "posts".into(),
                error: Error::Unclassifiable { kind: "regex", path: "$.pattern".into() },
            },
        ]));
        let text = error.to_string();
        assert!(text.starts_with("2 target(s) failed:"));
        assert!(text.contains("\n  users: no input files for target `users`"));
        assert!(text.contains("\n  posts: cannot determine type for regex value at $.pattern"));
    }

    #[test]
    fn io_cause_is_reported_once() {
        let error = Error::Io {
            path: PathBuf::from("dump/users.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(error.to_string(), "failed to read dump/users.json");
        assert_eq!(format!("{:#}", anyhow::Error::from(error)), "failed to read dump/users.json: gone");

        let summary = TargetFailures(vec![TargetFailure {
            target: "users".into(),
            error: Error::Io {
                path: PathBuf::from("dump/users.json"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            },
        }]);
        assert_eq!(summary.to_string(), "1 target(s) failed:\n  users: failed to read dump/users.json: gone");
    }
}
