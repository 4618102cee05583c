// Credential Domain Model

use serde::{Deserialize, Serialize};

use super::error::CredentialError;

/// Numeric identity a child process is dropped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    pub uid: u32,
    pub gid: u32,
}

impl Credentials {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self { uid, gid }
    }

    /// Parse textual uid/gid fields as found in a user database entry
    ///
    /// Anything that is not an unsigned 32-bit decimal is rejected.
    pub fn parse(username: &str, uid: &str, gid: &str) -> Result<Self, CredentialError> {
        let uid = parse_id(username, "uid", uid)?;
        let gid = parse_id(username, "gid", gid)?;
        Ok(Self { uid, gid })
    }
}

fn parse_id(username: &str, field: &'static str, value: &str) -> Result<u32, CredentialError> {
    // u32::from_str accepts a leading '+', which no user database writes
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CredentialError::InvalidId {
            username: username.to_string(),
            field,
            value: value.to_string(),
        });
    }

    value.parse::<u32>().map_err(|_| CredentialError::InvalidId {
        username: username.to_string(),
        field,
        value: value.to_string(),
    })
}
