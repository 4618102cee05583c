// Credential resolver implementations
// reason: nix for getpwnam_r without hand-written FFI (ADR-001)
use std::path::PathBuf;
use tracing::debug;

use privexec_core::domain::{CredentialError, Credentials};
use privexec_core::port::CredentialResolver;

/// Resolver backed by the OS user database (getpwnam)
#[derive(Debug, Default, Clone, Copy)]
pub struct PasswdCredentialResolver;

impl PasswdCredentialResolver {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialResolver for PasswdCredentialResolver {
    #[cfg(unix)]
    fn resolve(&self, username: &str) -> Result<Credentials, CredentialError> {
        use nix::unistd::User;

        match User::from_name(username) {
            Ok(Some(user)) => {
                let credentials = Credentials::new(user.uid.as_raw(), user.gid.as_raw());
                debug!(uid = credentials.uid, gid = credentials.gid, "User resolved");
                Ok(credentials)
            }
            Ok(None) => Err(CredentialError::NotFound(username.to_string())),
            Err(errno) => Err(CredentialError::Database {
                username: username.to_string(),
                reason: errno.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn resolve(&self, username: &str) -> Result<Credentials, CredentialError> {
        Err(CredentialError::Database {
            username: username.to_string(),
            reason: "no user database on this platform".to_string(),
        })
    }
}

/// Resolver reading a passwd(5)-format file
///
/// Useful for containers and chroots whose user table differs from the host's.
/// Fields are `name:password:uid:gid:gecos:home:shell`; uid and gid must be decimal.
#[derive(Debug, Clone)]
pub struct PasswdFileResolver {
    path: PathBuf,
}

impl PasswdFileResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialResolver for PasswdFileResolver {
    fn resolve(&self, username: &str) -> Result<Credentials, CredentialError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| CredentialError::Database {
                username: username.to_string(),
                reason: format!("{}: {}", self.path.display(), e),
            })?;

        let entry = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.split(':').collect::<Vec<_>>())
            .find(|fields| fields.first() == Some(&username))
            .ok_or_else(|| CredentialError::NotFound(username.to_string()))?;

        if entry.len() < 4 {
            return Err(CredentialError::Database {
                username: username.to_string(),
                reason: format!("malformed entry in {}", self.path.display()),
            });
        }

        Credentials::parse(username, entry[2], entry[3])
    }
}
