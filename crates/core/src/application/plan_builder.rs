// Execution Plan Builder
// Turns ShellSettings into a concrete process invocation

use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::quote::strip_unsafe;
use crate::domain::{
    Credentials, DeadlineEnforcement, ExecutionPlan, PlanDefaults, ShellSettings, Sink,
};
use crate::error::{Result, ShellError};
use crate::port::CredentialResolver;

/// Plan builder (one per call, borrows the shell's collaborators)
pub struct PlanBuilder<'a> {
    resolver: &'a dyn CredentialResolver,
    defaults: &'a PlanDefaults,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(resolver: &'a dyn CredentialResolver, defaults: &'a PlanDefaults) -> Self {
        Self { resolver, defaults }
    }

    /// Build the plan
    ///
    /// Steps run in a fixed order and the first failure short-circuits:
    /// 1. sub-shell composition (if requested)
    /// 2. deadline computation and wrapping
    /// 3. credential resolution
    /// 4. sink opening (stdout, then stderr)
    /// 5. environment composition
    ///
    /// Nothing is launched here; a failed build leaves no child behind.
    pub fn build<I>(&self, settings: &ShellSettings, inherited_env: I) -> Result<ExecutionPlan>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        validate_defaults(self.defaults)?;

        if settings.command.trim().is_empty() {
            return Err(ShellError::InvalidSettings(
                "command must not be empty".to_string(),
            ));
        }

        // 1. Sub-shell composition
        let (program, args) = if settings.use_sub_shell {
            compose_sub_shell(self.defaults, &settings.command, &settings.args)
        } else {
            (settings.command.clone(), settings.args.clone())
        };

        // 2. Deadline
        let deadline_secs = effective_deadline(
            settings.execution_timeout_secs,
            settings.disable_timeout_hard_limit,
            self.defaults,
        );
        let argv = match self.defaults.enforcement {
            DeadlineEnforcement::External => {
                wrap_with_deadline(&self.defaults.timeout_binary, deadline_secs, program, args)
            }
            DeadlineEnforcement::InProcess => std::iter::once(program).chain(args).collect(),
        };

        // 3. Credentials
        let credentials = self.resolve_credentials(settings)?;

        // 4. Sinks
        let stdout = open_sink("stdout", settings.stdout_file_path.as_deref())?;
        let stderr = open_sink("stderr", settings.stderr_file_path.as_deref())?;

        // 5. Environment
        let env = compose_environment(
            inherited_env,
            self.defaults.noninteractive_env.as_deref(),
            &settings.envs,
        );

        let plan = ExecutionPlan {
            argv,
            deadline: Duration::from_secs(deadline_secs),
            enforcement: self.defaults.enforcement,
            credentials,
            working_directory: settings.working_directory.clone(),
            env,
            stdout,
            stderr,
            // The shell resolves sub-shell commands itself; only the shell is checked
            preflight: Some(if settings.use_sub_shell {
                self.defaults.shell_binary.clone()
            } else {
                settings.command.clone()
            }),
        };

        debug!(
            argv = ?plan.argv.iter().map(strip_unsafe).collect::<Vec<_>>(),
            deadline_secs = deadline_secs,
            enforcement = %plan.enforcement,
            credentials = ?plan.credentials,
            working_directory = ?plan.working_directory,
            env_entries = plan.env.len(),
            "Execution plan built"
        );

        Ok(plan)
    }

    fn resolve_credentials(&self, settings: &ShellSettings) -> Result<Option<Credentials>> {
        let Some(username) = settings.target_username() else {
            return Ok(None);
        };

        match self.resolver.resolve(username) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(e) if settings.ignore_username_lookup_error => {
                warn!(
                    username = %strip_unsafe(username),
                    error = %e,
                    "Username lookup failed, running under the caller's identity"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_defaults(defaults: &PlanDefaults) -> Result<()> {
    if defaults.default_deadline_secs == 0 || defaults.deadline_hard_cap_secs == 0 {
        return Err(ShellError::InvalidSettings(
            "default deadline and hard cap must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Flatten command + args into one string run by a profile-sourcing shell
///
/// Arguments are joined with single spaces and lose their individual quoting;
/// untrusted values must already have gone through `quote`.
pub fn compose_sub_shell(
    defaults: &PlanDefaults,
    command: &str,
    args: &[String],
) -> (String, Vec<String>) {
    let joined = std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");

    (
        defaults.shell_binary.clone(),
        vec![
            "-c".to_string(),
            format!("source {}; {}", defaults.profile_path, joined),
        ],
    )
}

/// Deadline in seconds: 0 means the default, then clamp to the hard cap unless disabled
pub fn effective_deadline(requested_secs: u64, disable_hard_cap: bool, defaults: &PlanDefaults) -> u64 {
    let secs = if requested_secs == 0 {
        defaults.default_deadline_secs
    } else {
        requested_secs
    };

    if !disable_hard_cap && secs > defaults.deadline_hard_cap_secs {
        defaults.deadline_hard_cap_secs
    } else {
        secs
    }
}

/// `timeout <secs> <program> [args...]`
pub fn wrap_with_deadline(
    timeout_binary: &str,
    deadline_secs: u64,
    program: String,
    args: Vec<String>,
) -> Vec<String> {
    let mut argv = Vec::with_capacity(args.len() + 3);
    argv.push(timeout_binary.to_string());
    argv.push(deadline_secs.to_string());
    argv.push(program);
    argv.extend(args);
    argv
}

/// Inherited environment, then the marker, then caller entries
///
/// Duplicate keys are kept in order; the child resolves them last-wins.
/// Entries without `=` (or with an empty key) are skipped.
pub fn compose_environment<I>(
    inherited: I,
    marker: Option<&str>,
    extra: &[String],
) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: Vec<(OsString, OsString)> = inherited.into_iter().collect();

    for entry in marker.into_iter().chain(extra.iter().map(String::as_str)) {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                env.push((OsString::from(key), OsString::from(value)));
            }
            _ => {
                warn!(
                    entry = %strip_unsafe(entry),
                    "Skipping environment entry without KEY=VALUE form"
                );
            }
        }
    }

    env
}

fn open_sink(stream: &'static str, path: Option<&Path>) -> Result<Sink> {
    let Some(path) = path else {
        return Ok(Sink::Memory);
    };

    let file = File::create(path).map_err(|source| ShellError::Sink {
        stream,
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Sink::File {
        path: path.to_path_buf(),
        file,
    })
}
