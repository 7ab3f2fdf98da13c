use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;

/// Bucket holding `canonical credential JSON -> raw token`.
pub const REGISTRY_BUCKET: &str = "authed_clients";
pub const TOKEN_BYTES_LENGTH: usize = 32;

/// A username/password pair from the bootstrap file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    /// Canonical serialized form used as the registry key
    /// (`{"username":..,"password":..}`, fields always in that order).
    pub fn registry_key(&self) -> Result<Vec<u8>, AuthError> {
        serde_json::to_vec(self).map_err(|e| AuthError::Serialization(e.to_string()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials as presented to `/authenticate`. Missing fields decode as
/// empty strings and simply fail to match a registered credential.
#[derive(Deserialize)]
pub struct PresentedCredential {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Opaque bearer token: 32 bytes from the OS CSPRNG.
#[derive(Clone, PartialEq, Eq)]
pub struct Token([u8; TOKEN_BYTES_LENGTH]);

impl Token {
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; TOKEN_BYTES_LENGTH];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::Randomness(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Rebuild a token from stored bytes; `None` on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; TOKEN_BYTES_LENGTH]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Standard (padded) base64, the form clients present.
    pub fn encode(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Outcome of one provisioning pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub created: usize,
    pub existing: usize,
}
