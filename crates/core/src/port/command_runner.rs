// Command Runner Port
// Launches a planned process and waits for it to exit

use async_trait::async_trait;

use crate::domain::{ExecutionPlan, ProcessOutput};
use crate::error::ShellError;

/// Command runner interface
///
/// One call maps to one child process and one wait. The runner owns the plan,
/// so file sinks are closed on every exit path before `run` returns.
///
/// Implementations:
/// - SubprocessRunner: tokio child process (infra-system)
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the plan to completion
    ///
    /// # Errors
    /// - ShellError::ExecutableNotFound if the program cannot be resolved
    /// - ShellError::Spawn if the OS refuses to start the process
    /// - ShellError::Io if waiting on the child or reading its output fails
    async fn run(&self, plan: ExecutionPlan) -> Result<ProcessOutput, ShellError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::{ExitKind, Sink};
    use std::ffi::OsString;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// What the mock saw of a plan (the plan itself is consumed)
    #[derive(Debug, Clone)]
    pub struct RecordedPlan {
        pub argv: Vec<String>,
        pub deadline: Duration,
        pub credentials: Option<crate::domain::Credentials>,
        pub working_directory: Option<PathBuf>,
        pub env: Vec<(OsString, OsString)>,
        pub stdout_path: Option<PathBuf>,
        pub stderr_path: Option<PathBuf>,
    }

    /// Mock runner returning a canned output
    pub struct MockCommandRunner {
        output: ProcessOutput,
        plans: Arc<Mutex<Vec<RecordedPlan>>>,
    }

    impl MockCommandRunner {
        pub fn new(output: ProcessOutput) -> Self {
            Self {
                output,
                plans: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success(stdout: impl Into<Vec<u8>>) -> Self {
            Self::new(ProcessOutput {
                exit: ExitKind::Exited(0),
                stdout: stdout.into(),
                stderr: Vec::new(),
            })
        }

        pub fn new_exit(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
            Self::new(ProcessOutput {
                exit: ExitKind::Exited(code),
                stdout: Vec::new(),
                stderr: stderr.into(),
            })
        }

        pub fn call_count(&self) -> usize {
            self.plans.lock().unwrap().len()
        }

        pub fn last_plan(&self) -> Option<RecordedPlan> {
            self.plans.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(&self, plan: ExecutionPlan) -> Result<ProcessOutput, ShellError> {
            let stdout_path = plan.stdout.path().cloned();
            let stderr_path = plan.stderr.path().cloned();

            self.plans.lock().unwrap().push(RecordedPlan {
                argv: plan.argv.clone(),
                deadline: plan.deadline,
                credentials: plan.credentials,
                working_directory: plan.working_directory.clone(),
                env: plan.env.clone(),
                stdout_path,
                stderr_path,
            });

            let mut output = self.output.clone();
            // A file sink never populates the matching buffer
            if matches!(plan.stdout, Sink::File { .. }) {
                output.stdout.clear();
            }
            if matches!(plan.stderr, Sink::File { .. }) {
                output.stderr.clear();
            }

            Ok(output)
        }
    }
}
