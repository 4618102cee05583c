// Privexec Infrastructure - System Adapters
// Implements: CredentialResolver, CommandRunner, privilege drop (ADR-002)

pub mod credential_resolver;
pub mod privilege;
pub mod subprocess_runner;

pub use credential_resolver::{PasswdCredentialResolver, PasswdFileResolver};
pub use privilege::{default_privilege_dropper, PrivilegeDropper, UnsupportedPrivilegeDropper};
pub use subprocess_runner::SubprocessRunner;

#[cfg(unix)]
pub use privilege::PosixPrivilegeDropper;

use std::sync::Arc;

use privexec_core::application::Shell;
use privexec_core::domain::PlanDefaults;
use privexec_core::port::time_provider::SystemTimeProvider;

/// Shell wired to the OS user database and real child processes
///
/// # Example
/// ```no_run
/// use privexec_core::ShellSettings;
///
/// let shell = privexec_infra_system::system_shell();
/// let stdout = shell.run_blocking(&ShellSettings::new("echo").arg("hello"))?;
/// assert_eq!(stdout, "hello");
/// # Ok::<(), privexec_core::ShellError>(())
/// ```
pub fn system_shell() -> Shell {
    system_shell_with(PlanDefaults::default())
}

/// Same as `system_shell`, with explicit plan defaults
pub fn system_shell_with(defaults: PlanDefaults) -> Shell {
    Shell::new(
        Arc::new(PasswdCredentialResolver::new()),
        Arc::new(SubprocessRunner::new(default_privilege_dropper())),
        Arc::new(SystemTimeProvider),
    )
    .with_defaults(defaults)
}
