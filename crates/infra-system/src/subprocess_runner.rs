// Subprocess runner implementation
// reason: tokio for async process management, nix for process-group signals (ADR-001)
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use privexec_core::application::constants::KILL_GRACE_PERIOD;
use privexec_core::application::quote::strip_unsafe;
use privexec_core::domain::{DeadlineEnforcement, ExecutionPlan, ExitKind, ProcessOutput, Sink};
use privexec_core::error::ShellError;
use privexec_core::port::CommandRunner;

use crate::privilege::PrivilegeDropper;

/// Search path used when the child environment carries no PATH (execvp default)
const DEFAULT_SEARCH_PATH: &str = "/bin:/usr/bin";

type PipeTask = JoinHandle<std::io::Result<Vec<u8>>>;

/// Subprocess runner
///
/// Spawns one child per plan, drains its pipes while waiting, and enforces the
/// deadline itself when the plan asks for in-process enforcement.
pub struct SubprocessRunner {
    dropper: Arc<dyn PrivilegeDropper>,
    kill_grace: Duration,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Arguments
    /// * `dropper` - Applies plan credentials to the child (see `default_privilege_dropper`)
    pub fn new(dropper: Arc<dyn PrivilegeDropper>) -> Self {
        Self {
            dropper,
            kill_grace: KILL_GRACE_PERIOD,
        }
    }

    /// Time between SIGTERM and SIGKILL for in-process enforcement
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Resolve every program the child will exec before anything is launched
    fn preflight(&self, plan: &ExecutionPlan) -> Result<(), ShellError> {
        let search_path = plan
            .env_value("PATH")
            .cloned()
            .unwrap_or_else(|| OsString::from(DEFAULT_SEARCH_PATH));
        let cwd = match &plan.working_directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let programs = std::iter::once(plan.program()).chain(plan.preflight.as_deref());
        for program in programs {
            resolve_executable(program, &search_path, &cwd)?;
        }

        Ok(())
    }

    /// Build the tokio command from a plan (consumes the sinks)
    fn build_command(&self, plan: ExecutionPlan) -> Result<(Command, bool, bool), ShellError> {
        let ExecutionPlan {
            argv,
            enforcement,
            credentials,
            working_directory,
            env,
            stdout,
            stderr,
            ..
        } = plan;

        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ShellError::InvalidSettings("empty argv".to_string()))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = working_directory {
            command.current_dir(dir);
        }

        if let Some(credentials) = credentials {
            debug!(
                uid = credentials.uid,
                gid = credentials.gid,
                dropper = self.dropper.name(),
                "Applying privilege drop"
            );
            self.dropper.apply(&mut command, credentials);
        }

        // Own process group so the deadline kill reaches grandchildren too
        #[cfg(unix)]
        if enforcement == DeadlineEnforcement::InProcess {
            command.process_group(0);
        }

        let capture_stdout = stdout.is_memory();
        let capture_stderr = stderr.is_memory();
        command.stdout(sink_stdio(stdout));
        command.stderr(sink_stdio(stderr));

        Ok((command, capture_stdout, capture_stderr))
    }

    /// SIGTERM the process group, then SIGKILL after the grace period
    async fn terminate(&self, child: &mut Child) -> std::io::Result<()> {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            let pgid = Pid::from_raw(pid as i32);

            warn!(pid = %pid, "Deadline exceeded, sending SIGTERM to process group");
            if killpg(pgid, Signal::SIGTERM).is_ok()
                && tokio::time::timeout(self.kill_grace, child.wait())
                    .await
                    .is_ok()
            {
                return Ok(());
            }

            warn!(pid = %pid, "Process group did not exit after SIGTERM, sending SIGKILL");
            let _ = killpg(pgid, Signal::SIGKILL);
        }

        child.kill().await
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, plan: ExecutionPlan) -> Result<ProcessOutput, ShellError> {
        self.preflight(&plan)?;

        let program = plan.program().to_string();
        let deadline = plan.deadline;
        let enforcement = plan.enforcement;
        let (mut command, capture_stdout, capture_stderr) = self.build_command(plan)?;

        let mut child = command.spawn().map_err(|source| ShellError::Spawn {
            program: strip_unsafe(&program),
            source,
        })?;
        // Our copies of the sink files close here; the child holds its own
        drop(command);

        debug!(
            pid = ?child.id(),
            program = %strip_unsafe(&program),
            capture_stdout = capture_stdout,
            capture_stderr = capture_stderr,
            "Child process spawned"
        );

        let stdout_task = child.stdout.take().map(|pipe| tokio::spawn(read_pipe(pipe)));
        let stderr_task = child.stderr.take().map(|pipe| tokio::spawn(read_pipe(pipe)));

        let exit = match enforcement {
            DeadlineEnforcement::External => exit_kind(child.wait().await?),
            DeadlineEnforcement::InProcess => {
                match tokio::time::timeout(deadline, child.wait()).await {
                    Ok(status) => exit_kind(status?),
                    Err(_) => {
                        self.terminate(&mut child).await?;
                        ExitKind::DeadlineExceeded
                    }
                }
            }
        };

        let stdout = join_pipe(stdout_task).await?;
        let stderr = join_pipe(stderr_task).await?;

        debug!(
            exit = ?exit,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "Child process finished"
        );

        Ok(ProcessOutput {
            exit,
            stdout,
            stderr,
        })
    }
}

fn resolve_executable(
    program: &str,
    search_path: &OsString,
    cwd: &Path,
) -> Result<PathBuf, ShellError> {
    which::which_in(program, Some(search_path), cwd).map_err(|e| {
        ShellError::ExecutableNotFound {
            program: strip_unsafe(program),
            reason: e.to_string(),
        }
    })
}

fn sink_stdio(sink: Sink) -> Stdio {
    match sink {
        Sink::Memory => Stdio::piped(),
        Sink::File { file, .. } => Stdio::from(file),
    }
}

async fn read_pipe<R>(mut pipe: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn join_pipe(task: Option<PipeTask>) -> Result<Vec<u8>, ShellError> {
    match task {
        Some(handle) => handle
            .await
            .map_err(|e| ShellError::Runtime(format!("pipe reader failed: {}", e)))?
            .map_err(ShellError::Io),
        None => Ok(Vec::new()),
    }
}

fn exit_kind(status: ExitStatus) -> ExitKind {
    if let Some(code) = status.code() {
        return ExitKind::Exited(code);
    }

    #[cfg(unix)]
    let signal = std::os::unix::process::ExitStatusExt::signal(&status).unwrap_or_default();
    #[cfg(not(unix))]
    let signal = 0;

    ExitKind::Signaled(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::default_privilege_dropper;
    use privexec_core::application::PlanBuilder;
    use privexec_core::domain::{PlanDefaults, ShellSettings};
    use privexec_core::port::credential_resolver::mocks::MockCredentialResolver;
    use std::time::Instant;

    fn runner() -> SubprocessRunner {
        SubprocessRunner::new(default_privilege_dropper())
    }

    fn plan(settings: &ShellSettings, defaults: &PlanDefaults) -> ExecutionPlan {
        let resolver = MockCredentialResolver::new();
        PlanBuilder::new(&resolver, defaults)
            .build(settings, std::env::vars_os())
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let defaults = PlanDefaults::default();
        let output = runner()
            .run(plan(&ShellSettings::new("echo").args(["hello"]), &defaults))
            .await
            .unwrap();

        assert_eq!(output.exit, ExitKind::Exited(0));
        assert_eq!(output.stdout, b"hello\n");
    }

    #[tokio::test]
    async fn test_run_captures_stderr_and_code() {
        let defaults = PlanDefaults::default();
        let output = runner()
            .run(plan(
                &ShellSettings::new("sh").args(["-c", "echo boom >&2; exit 3"]),
                &defaults,
            ))
            .await
            .unwrap();

        assert_eq!(output.exit, ExitKind::Exited(3));
        assert_eq!(output.stderr, b"boom\n");
    }

    #[tokio::test]
    async fn test_missing_executable_is_opaque() {
        let defaults = PlanDefaults::default();
        let err = runner()
            .run(plan(&ShellSettings::new("privexec-definitely-missing"), &defaults))
            .await
            .unwrap_err();

        assert!(matches!(err, ShellError::ExecutableNotFound { .. }));
    }

    #[tokio::test]
    async fn test_in_process_deadline_kills_child() {
        let defaults = PlanDefaults {
            enforcement: DeadlineEnforcement::InProcess,
            ..Default::default()
        };
        let started = Instant::now();

        let output = runner()
            .with_kill_grace(Duration::from_millis(500))
            .run(plan(
                &ShellSettings::new("sh")
                    .args(["-c", "echo partial >&2; sleep 30"])
                    .timeout_secs(1),
                &defaults,
            ))
            .await
            .unwrap();

        assert_eq!(output.exit, ExitKind::DeadlineExceeded);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_file_sink_receives_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.log");
        let defaults = PlanDefaults::default();

        let output = runner()
            .run(plan(
                &ShellSettings::new("echo").args(["to-file"]).stdout_file(&out),
                &defaults,
            ))
            .await
            .unwrap();

        assert_eq!(output.exit, ExitKind::Exited(0));
        assert!(output.stdout.is_empty());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "to-file\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_kind_signal() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(exit_kind(ExitStatus::from_raw(9)), ExitKind::Signaled(9));
        assert_eq!(exit_kind(ExitStatus::from_raw(2 << 8)), ExitKind::Exited(2));
    }
}
