// Command Failure Domain Model

use serde::{Deserialize, Serialize};

/// Exit code reserved by the deadline enforcer for kill-on-timeout
pub const DEADLINE_EXIT_CODE: i32 = 124;

/// Fixed stderr text carried by every deadline failure
pub const DEADLINE_EXCEEDED_MESSAGE: &str = "CommandDeadlineExceeded";

/// A child process that ran and exited non-zero (or was killed by the deadline enforcer)
///
/// Serializes to `{"stdErr": "...", "exitCode": N}`; the `Display` form is that JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFailure {
    #[serde(rename = "stdErr")]
    pub stderr: String,

    #[serde(rename = "exitCode")]
    pub exit_code: i32,
}

impl CommandFailure {
    /// Build a failure from an exit code and captured stderr
    ///
    /// Exit code 124 always carries [`DEADLINE_EXCEEDED_MESSAGE`], whatever the child wrote.
    pub fn new(exit_code: i32, stderr: impl Into<String>) -> Self {
        if exit_code == DEADLINE_EXIT_CODE {
            return Self::deadline_exceeded();
        }

        Self {
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn deadline_exceeded() -> Self {
        Self {
            stderr: DEADLINE_EXCEEDED_MESSAGE.to_string(),
            exit_code: DEADLINE_EXIT_CODE,
        }
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        self.exit_code == DEADLINE_EXIT_CODE
    }
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(
                f,
                "{{\"stdErr\":{:?},\"exitCode\":{}}}",
                self.stderr, self.exit_code
            ),
        }
    }
}

impl std::error::Error for CommandFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_json() {
        let failure = CommandFailure::new(2, "no such file");
        assert_eq!(
            failure.to_string(),
            r#"{"stdErr":"no such file","exitCode":2}"#
        );
    }

    #[test]
    fn test_deadline_code_overrides_stderr() {
        let failure = CommandFailure::new(124, "partial output before kill");

        assert_eq!(failure.exit_code, DEADLINE_EXIT_CODE);
        assert_eq!(failure.stderr, DEADLINE_EXCEEDED_MESSAGE);
        assert!(failure.is_deadline_exceeded());
    }

    #[test]
    fn test_deserialize_wire_names() {
        let failure: CommandFailure =
            serde_json::from_str(r#"{"stdErr":"boom","exitCode":1}"#).unwrap();

        assert_eq!(failure, CommandFailure::new(1, "boom"));
        assert!(!failure.is_deadline_exceeded());
    }
}
