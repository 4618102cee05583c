// Privilege drop capability
// Platform-specific credential switching for the child process
use std::sync::Arc;
use tokio::process::Command;
use tracing::warn;

use privexec_core::domain::Credentials;

/// Applies a target identity to a command before it is spawned
///
/// Implementations:
/// - PosixPrivilegeDropper: setgid/setuid in the child (unix)
/// - UnsupportedPrivilegeDropper: no-op for platforms without uid/gid
pub trait PrivilegeDropper: Send + Sync {
    fn apply(&self, command: &mut Command, credentials: Credentials);

    fn name(&self) -> &'static str;
}

/// uid/gid switch performed by the child between fork and exec
///
/// Requires the caller to be privileged unless the target is its own identity;
/// otherwise the spawn fails with a permission error.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixPrivilegeDropper;

#[cfg(unix)]
impl PrivilegeDropper for PosixPrivilegeDropper {
    fn apply(&self, command: &mut Command, credentials: Credentials) {
        // gid first: once uid is dropped setgid is no longer permitted
        command.gid(credentials.gid);
        command.uid(credentials.uid);
    }

    fn name(&self) -> &'static str {
        "posix"
    }
}

/// Best-effort fallback: the child keeps the caller's identity
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPrivilegeDropper;

impl PrivilegeDropper for UnsupportedPrivilegeDropper {
    fn apply(&self, _command: &mut Command, credentials: Credentials) {
        warn!(
            uid = credentials.uid,
            gid = credentials.gid,
            "Privilege drop not supported on this platform, running as caller"
        );
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}

/// Platform default
pub fn default_privilege_dropper() -> Arc<dyn PrivilegeDropper> {
    #[cfg(unix)]
    {
        Arc::new(PosixPrivilegeDropper)
    }

    #[cfg(not(unix))]
    {
        Arc::new(UnsupportedPrivilegeDropper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_posix_drop_to_own_identity() {
        use nix::unistd::{getegid, geteuid};

        let own = Credentials::new(geteuid().as_raw(), getegid().as_raw());

        let mut command = Command::new("id");
        command.arg("-u");
        PosixPrivilegeDropper.apply(&mut command, own);

        let output = command.output().await.unwrap();
        assert!(output.status.success());
        assert_eq!(
            String::from_utf8_lossy(&output.stdout).trim(),
            own.uid.to_string()
        );
    }

    #[tokio::test]
    async fn test_unsupported_drop_is_noop() {
        let mut command = Command::new("true");
        UnsupportedPrivilegeDropper.apply(&mut command, Credentials::new(4242, 4242));

        let status = command.status().await.unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_default_dropper() {
        let dropper = default_privilege_dropper();

        #[cfg(unix)]
        assert_eq!(dropper.name(), "posix");
        #[cfg(not(unix))]
        assert_eq!(dropper.name(), "unsupported");
    }
}
