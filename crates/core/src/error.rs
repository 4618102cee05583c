// Central Error Type for command execution

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{CommandFailure, CredentialError};

/// Error returned by `Shell::run`
///
/// `Command` is the only classified outcome: the child ran and exited non-zero.
/// Every other variant is a configuration or launch error and no child ran to completion.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Command(#[from] CommandFailure),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Failed to open {stream} sink {}: {source}", .path.display())]
    Sink {
        stream: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Executable not found: {program} ({reason})")]
    ExecutableNotFound { program: String, reason: String },

    #[error("Spawn failed for {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ShellError {
    /// The structured failure, if the child ran and exited non-zero
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            ShellError::Command(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        self.command_failure()
            .is_some_and(CommandFailure::is_deadline_exceeded)
    }
}

/// Result type alias using ShellError
pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failure_display_is_json() {
        let err = ShellError::from(CommandFailure::new(3, "bad"));
        assert_eq!(err.to_string(), r#"{"stdErr":"bad","exitCode":3}"#);
        assert!(err.command_failure().is_some());
        assert!(!err.is_deadline_exceeded());
    }

    #[test]
    fn test_opaque_errors_have_no_failure() {
        let err = ShellError::from(CredentialError::NotFound("ghost".into()));
        assert!(err.command_failure().is_none());
        assert!(err.to_string().contains("ghost"));
    }
}
