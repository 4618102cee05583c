// Shell Settings (per-call execution request)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Execution request, constructed fresh per call and consumed once
///
/// # Example
/// ```text
/// let settings = ShellSettings::new("git")
///     .args(["status", "--short"])
///     .username("deploy")
///     .working_directory("/srv/app")
///     .timeout_secs(60);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    pub command: String,
    pub args: Vec<String>,

    /// Flatten command + args and re-run through a profile-sourcing shell
    pub use_sub_shell: bool,

    /// Allow deadlines above the hard cap
    pub disable_timeout_hard_limit: bool,

    /// Run under the caller's identity if `username` cannot be resolved
    pub ignore_username_lookup_error: bool,

    pub username: Option<String>,
    pub working_directory: Option<PathBuf>,

    /// Requested deadline; 0 means the default
    pub execution_timeout_secs: u64,

    /// `KEY=VALUE` entries appended after the inherited environment
    pub envs: Vec<String>,

    pub stdout_file_path: Option<PathBuf>,
    pub stderr_file_path: Option<PathBuf>,
}

impl ShellSettings {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn sub_shell(mut self, enabled: bool) -> Self {
        self.use_sub_shell = enabled;
        self
    }

    pub fn disable_timeout_hard_limit(mut self, disabled: bool) -> Self {
        self.disable_timeout_hard_limit = disabled;
        self
    }

    pub fn ignore_username_lookup_error(mut self, ignore: bool) -> Self {
        self.ignore_username_lookup_error = ignore;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.execution_timeout_secs = secs;
        self
    }

    pub fn env(mut self, entry: impl Into<String>) -> Self {
        self.envs.push(entry.into());
        self
    }

    pub fn stdout_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file_path = Some(path.into());
        self
    }

    pub fn stderr_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr_file_path = Some(path.into());
        self
    }

    /// Username to drop privileges to, if any (empty counts as absent)
    pub fn target_username(&self) -> Option<&str> {
        self.username.as_deref().filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let settings = ShellSettings::new("echo")
            .args(["a", "b"])
            .arg("c")
            .sub_shell(true)
            .timeout_secs(10)
            .env("FOO=bar");

        assert_eq!(settings.command, "echo");
        assert_eq!(settings.args, vec!["a", "b", "c"]);
        assert!(settings.use_sub_shell);
        assert_eq!(settings.execution_timeout_secs, 10);
        assert_eq!(settings.envs, vec!["FOO=bar"]);
        assert!(settings.stdout_file_path.is_none());
    }

    #[test]
    fn test_empty_username_is_absent() {
        assert_eq!(ShellSettings::new("id").username("").target_username(), None);
        assert_eq!(
            ShellSettings::new("id").username("www").target_username(),
            Some("www")
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: ShellSettings = serde_json::from_value(serde_json::json!({
            "command": "ls",
            "args": ["-la"],
            "execution_timeout_secs": 5
        }))
        .unwrap();

        assert_eq!(settings.command, "ls");
        assert_eq!(settings.args, vec!["-la"]);
        assert_eq!(settings.execution_timeout_secs, 5);
        assert!(!settings.use_sub_shell);
    }
}
