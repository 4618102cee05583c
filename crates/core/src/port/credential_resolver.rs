// Credential Resolver Port
// Maps a username onto the numeric identity used for privilege drop

use crate::domain::{CredentialError, Credentials};

/// Credential resolver interface
///
/// Implementations:
/// - PasswdCredentialResolver: OS user database (infra-system)
/// - PasswdFileResolver: passwd(5)-format file (infra-system)
pub trait CredentialResolver: Send + Sync {
    /// Resolve a username to its uid/gid pair
    ///
    /// # Errors
    /// - CredentialError::NotFound if the user does not exist
    /// - CredentialError::Database if the user database is unreadable
    /// - CredentialError::InvalidId if the entry carries a non-numeric uid/gid
    fn resolve(&self, username: &str) -> Result<Credentials, CredentialError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock resolver backed by a fixed table
    #[derive(Default)]
    pub struct MockCredentialResolver {
        users: HashMap<String, Credentials>,
        lookups: Mutex<Vec<String>>,
    }

    impl MockCredentialResolver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_user(mut self, username: impl Into<String>, uid: u32, gid: u32) -> Self {
            self.users
                .insert(username.into(), Credentials::new(uid, gid));
            self
        }

        pub fn lookups(&self) -> Vec<String> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl CredentialResolver for MockCredentialResolver {
        fn resolve(&self, username: &str) -> Result<Credentials, CredentialError> {
            self.lookups.lock().unwrap().push(username.to_string());

            self.users
                .get(username)
                .copied()
                .ok_or_else(|| CredentialError::NotFound(username.to_string()))
        }
    }
}
