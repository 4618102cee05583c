// Shell Service - the `run` use case

use std::ffi::OsString;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::outcome::classify;
use crate::application::plan_builder::PlanBuilder;
use crate::application::quote::strip_unsafe;
use crate::domain::{PlanDefaults, ShellSettings};
use crate::error::{Result, ShellError};
use crate::port::{CommandRunner, CredentialResolver, TimeProvider};

/// Shell service
///
/// Holds no per-call state: every `run` builds its own plan, buffers and file
/// handles, so one `Shell` can be shared across threads.
pub struct Shell {
    resolver: Arc<dyn CredentialResolver>,
    runner: Arc<dyn CommandRunner>,
    time_provider: Arc<dyn TimeProvider>,
    defaults: PlanDefaults,
}

impl Shell {
    /// Create a new shell service
    ///
    /// # Arguments
    /// * `resolver` - Username → uid/gid lookup
    /// * `runner` - Launches planned processes
    /// * `time_provider` - Time provider for duration tracking
    pub fn new(
        resolver: Arc<dyn CredentialResolver>,
        runner: Arc<dyn CommandRunner>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            resolver,
            runner,
            time_provider,
            defaults: PlanDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: PlanDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run a command and return its trimmed stdout
    ///
    /// The child inherits this process's environment.
    ///
    /// # Errors
    /// - ShellError::Command if the child exited non-zero (exit code 124 = deadline)
    /// - any other variant for configuration or launch failures
    pub async fn run(&self, settings: &ShellSettings) -> Result<String> {
        self.run_with_env(settings, std::env::vars_os().collect::<Vec<_>>()).await
    }

    /// Same as `run`, with an explicit inherited environment
    pub async fn run_with_env<I>(&self, settings: &ShellSettings, inherited_env: I) -> Result<String>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let command = strip_unsafe(&settings.command);
        let plan = PlanBuilder::new(self.resolver.as_ref(), &self.defaults)
            .build(settings, inherited_env)?;

        let start_time = self.time_provider.now_millis();

        info!(
            command = %command,
            args = settings.args.len(),
            deadline_secs = plan.deadline.as_secs(),
            enforcement = %plan.enforcement,
            run_as = ?plan.credentials,
            "Starting command execution"
        );

        let output = self.runner.run(plan).await?;
        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = classify(output);

        match &result {
            Ok(_) => info!(
                command = %command,
                duration_ms = %duration_ms,
                "Command execution completed"
            ),
            Err(e) => match e.command_failure() {
                Some(failure) if failure.is_deadline_exceeded() => warn!(
                    command = %command,
                    duration_ms = %duration_ms,
                    "Command deadline exceeded"
                ),
                Some(failure) => info!(
                    command = %command,
                    duration_ms = %duration_ms,
                    exit_code = failure.exit_code,
                    "Command exited non-zero"
                ),
                None => {}
            },
        }

        result
    }

    /// Blocking form of `run`
    ///
    /// Builds a current-thread runtime for the duration of the call, so it must
    /// not be called from inside an async context.
    pub fn run_blocking(&self, settings: &ShellSettings) -> Result<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ShellError::Runtime(e.to_string()))?;

        runtime.block_on(self.run(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Credentials, DeadlineEnforcement};
    use crate::port::command_runner::mocks::MockCommandRunner;
    use crate::port::credential_resolver::mocks::MockCredentialResolver;
    use crate::port::time_provider::mocks::SteppingTimeProvider;
    use std::time::Duration;

    fn shell(runner: Arc<MockCommandRunner>) -> Shell {
        Shell::new(
            Arc::new(MockCredentialResolver::new().with_user("deploy", 1001, 100)),
            runner,
            Arc::new(SteppingTimeProvider::new(0, 10)),
        )
    }

    fn env() -> Vec<(OsString, OsString)> {
        vec![(OsString::from("PATH"), OsString::from("/usr/bin"))]
    }

    #[tokio::test]
    async fn test_run_success_trims_stdout() {
        let runner = Arc::new(MockCommandRunner::new_success("hello\n"));
        let shell = shell(runner.clone());

        let stdout = shell
            .run_with_env(&ShellSettings::new("echo").args(["hello"]), env())
            .await
            .unwrap();

        assert_eq!(stdout, "hello");
        assert_eq!(runner.call_count(), 1);
        assert_eq!(
            runner.last_plan().unwrap().argv,
            vec!["timeout", "1800", "echo", "hello"]
        );
    }

    #[tokio::test]
    async fn test_run_failure_is_structured() {
        let runner = Arc::new(MockCommandRunner::new_exit(1, ""));
        let shell = shell(runner);

        let err = shell
            .run_with_env(&ShellSettings::new("false"), env())
            .await
            .unwrap_err();

        let failure = err.command_failure().unwrap();
        assert_ne!(failure.exit_code, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_never_launches() {
        let runner = Arc::new(MockCommandRunner::new_success("should not run"));
        let resolver = Arc::new(MockCredentialResolver::new());
        let shell = Shell::new(
            resolver.clone(),
            runner.clone(),
            Arc::new(SteppingTimeProvider::new(0, 10)),
        );

        let err = shell
            .run_with_env(&ShellSettings::new("id").username("ghost"), env())
            .await
            .unwrap_err();

        assert!(matches!(err, ShellError::Credential(_)));
        assert_eq!(resolver.lookups(), vec!["ghost"]);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_user_ignored_runs_without_drop() {
        let runner = Arc::new(MockCommandRunner::new_success("1000"));
        let shell = shell(runner.clone());

        let stdout = shell
            .run_with_env(
                &ShellSettings::new("id")
                    .username("ghost")
                    .ignore_username_lookup_error(true),
                env(),
            )
            .await
            .unwrap();

        assert_eq!(stdout, "1000");
        assert_eq!(runner.last_plan().unwrap().credentials, None);
    }

    #[tokio::test]
    async fn test_known_user_carries_credentials() {
        let runner = Arc::new(MockCommandRunner::new_success(""));
        let shell = shell(runner.clone());

        shell
            .run_with_env(&ShellSettings::new("id").username("deploy"), env())
            .await
            .unwrap();

        assert_eq!(
            runner.last_plan().unwrap().credentials,
            Some(Credentials::new(1001, 100))
        );
    }

    #[tokio::test]
    async fn test_file_sink_leaves_stdout_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.log");
        let runner = Arc::new(MockCommandRunner::new_success("ignored"));
        let shell = shell(runner.clone());

        let stdout = shell
            .run_with_env(&ShellSettings::new("ls").stdout_file(&out), env())
            .await
            .unwrap();

        assert_eq!(stdout, "");
        assert_eq!(runner.last_plan().unwrap().stdout_path, Some(out));
    }

    #[tokio::test]
    async fn test_environment_marker_and_extras() {
        let runner = Arc::new(MockCommandRunner::new_success(""));
        let shell = shell(runner.clone());

        shell
            .run_with_env(&ShellSettings::new("env").env("PATH=/opt/bin"), env())
            .await
            .unwrap();

        let plan = runner.last_plan().unwrap();
        let keys: Vec<String> = plan
            .env
            .iter()
            .map(|(k, _)| k.to_string_lossy().into_owned())
            .collect();
        assert_eq!(keys, vec!["PATH", "DEBIAN_FRONTEND", "PATH"]);
    }

    #[tokio::test]
    async fn test_custom_defaults() {
        let runner = Arc::new(MockCommandRunner::new_success(""));
        let shell = shell(runner.clone()).with_defaults(PlanDefaults {
            enforcement: DeadlineEnforcement::InProcess,
            default_deadline_secs: 30,
            noninteractive_env: None,
            ..Default::default()
        });

        shell
            .run_with_env(&ShellSettings::new("ls"), env())
            .await
            .unwrap();

        let plan = runner.last_plan().unwrap();
        assert_eq!(plan.argv, vec!["ls"]);
        assert_eq!(plan.deadline, Duration::from_secs(30));
        assert_eq!(plan.env.len(), 1);
    }

    #[test]
    fn test_run_blocking() {
        let runner = Arc::new(MockCommandRunner::new_success(" ok "));
        let shell = shell(runner);

        assert_eq!(shell.run_blocking(&ShellSettings::new("true")).unwrap(), "ok");
    }
}
