// Execution Plan Domain Model

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use super::Credentials;

/// How the deadline is enforced on the child
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineEnforcement {
    /// Wrap argv in the external `timeout` program
    #[default]
    External,
    /// Leave argv alone; the runner kills the child when the timer fires
    InProcess,
}

impl std::fmt::Display for DeadlineEnforcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeadlineEnforcement::External => write!(f, "external"),
            DeadlineEnforcement::InProcess => write!(f, "in_process"),
        }
    }
}

/// Plan-wide defaults (one per `Shell`, not per call)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanDefaults {
    /// Shell used for sub-shell composition
    pub shell_binary: String,
    /// Profile sourced before a sub-shell command
    pub profile_path: String,
    /// Deadline-enforcing program for `DeadlineEnforcement::External`
    pub timeout_binary: String,
    pub default_deadline_secs: u64,
    pub deadline_hard_cap_secs: u64,
    /// Marker appended after the inherited environment to disable package-manager prompts
    pub noninteractive_env: Option<String>,
    pub enforcement: DeadlineEnforcement,
}

impl Default for PlanDefaults {
    fn default() -> Self {
        use crate::application::constants::*;

        Self {
            shell_binary: DEFAULT_SHELL_BINARY.to_string(),
            profile_path: DEFAULT_PROFILE_PATH.to_string(),
            timeout_binary: DEFAULT_TIMEOUT_BINARY.to_string(),
            default_deadline_secs: DEFAULT_DEADLINE_SECS,
            deadline_hard_cap_secs: DEADLINE_HARD_CAP_SECS,
            noninteractive_env: Some(NONINTERACTIVE_ENV.to_string()),
            enforcement: DeadlineEnforcement::External,
        }
    }
}

/// Destination for one output stream
#[derive(Debug)]
pub enum Sink {
    /// Captured in memory and returned to the caller
    Memory,
    /// Written to an already-opened file; closed when the plan is dropped
    File { path: PathBuf, file: File },
}

impl Sink {
    pub fn is_memory(&self) -> bool {
        matches!(self, Sink::Memory)
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Sink::Memory => None,
            Sink::File { path, .. } => Some(path),
        }
    }
}

/// Concrete process invocation produced by the plan builder
#[derive(Debug)]
pub struct ExecutionPlan {
    /// argv[0] is the program actually launched
    pub argv: Vec<String>,
    pub deadline: Duration,
    pub enforcement: DeadlineEnforcement,
    pub credentials: Option<Credentials>,
    pub working_directory: Option<PathBuf>,
    /// Full child environment in order; duplicate keys are kept (last wins in the child)
    pub env: Vec<(OsString, OsString)>,
    pub stdout: Sink,
    pub stderr: Sink,
    /// Executable to resolve before launch besides argv[0]
    /// (the user command, or the shell binary in sub-shell mode)
    pub preflight: Option<String>,
}

impl ExecutionPlan {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Value a child would see for `key` (last entry wins)
    pub fn env_value(&self, key: &str) -> Option<&OsString> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k.as_os_str() == key)
            .map(|(_, v)| v)
    }
}

/// How the child terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Exited(i32),
    /// Terminated by a signal outside deadline enforcement
    Signaled(i32),
    /// Killed by the in-process deadline enforcer
    DeadlineExceeded,
}

/// Raw result of running a plan, before classification
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit: ExitKind,
    /// Empty when stdout went to a file sink
    pub stdout: Vec<u8>,
    /// Empty when stderr went to a file sink
    pub stderr: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_env(env: Vec<(&str, &str)>) -> ExecutionPlan {
        ExecutionPlan {
            argv: vec!["timeout".into(), "5".into(), "ls".into()],
            deadline: Duration::from_secs(5),
            enforcement: DeadlineEnforcement::External,
            credentials: None,
            working_directory: None,
            env: env
                .into_iter()
                .map(|(k, v)| (OsString::from(k), OsString::from(v)))
                .collect(),
            stdout: Sink::Memory,
            stderr: Sink::Memory,
            preflight: Some("ls".into()),
        }
    }

    #[test]
    fn test_program() {
        let plan = plan_with_env(vec![]);
        assert_eq!(plan.program(), "timeout");
    }

    #[test]
    fn test_env_value_last_wins() {
        let plan = plan_with_env(vec![("PATH", "/bin"), ("FOO", "a"), ("FOO", "b")]);

        assert_eq!(plan.env_value("FOO"), Some(&OsString::from("b")));
        assert_eq!(plan.env_value("PATH"), Some(&OsString::from("/bin")));
        assert_eq!(plan.env_value("MISSING"), None);
    }

    #[test]
    fn test_defaults() {
        let defaults = PlanDefaults::default();
        assert_eq!(defaults.default_deadline_secs, 1800);
        assert_eq!(defaults.deadline_hard_cap_secs, 3600);
        assert_eq!(defaults.timeout_binary, "timeout");
        assert_eq!(
            defaults.noninteractive_env.as_deref(),
            Some("DEBIAN_FRONTEND=noninteractive")
        );
        assert_eq!(defaults.enforcement, DeadlineEnforcement::External);
    }

    #[test]
    fn test_enforcement_serde_names() {
        let mode: DeadlineEnforcement = serde_json::from_str("\"in_process\"").unwrap();
        assert_eq!(mode, DeadlineEnforcement::InProcess);
        assert_eq!(mode.to_string(), "in_process");
    }
}
