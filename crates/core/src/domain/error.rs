// Domain Error Types

use thiserror::Error;

/// Failure to map a username onto a numeric identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User database lookup failed for '{username}': {reason}")]
    Database { username: String, reason: String },

    #[error("Invalid {field} '{value}' for user '{username}'")]
    InvalidId {
        username: String,
        field: &'static str,
        value: String,
    },
}
