//! Credential resolution.
//!
//! The server knows a single credential pair (configurable, default
//! `S3RVER`/`S3RVER`); the provider trait keeps the verifiers testable with
//! other key sets.

use crate::error::AuthError;

/// Resolves an access key ID to its secret key.
pub trait CredentialProvider: Send + Sync {
    /// Look up the secret key for an access key ID.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownAccessKey`] when the access key is not
    /// recognized.
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError>;
}

/// A fixed in-memory credential set.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credentials: Vec<(String, String)>,
}

impl StaticCredentialProvider {
    /// Create a provider over a list of `(access_key_id, secret_key)` pairs.
    #[must_use]
    pub fn new(credentials: Vec<(String, String)>) -> Self {
        Self { credentials }
    }

    /// Create a provider holding a single credential pair.
    #[must_use]
    pub fn single(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            credentials: vec![(access_key_id.into(), secret_key.into())],
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, access_key_id: &str) -> Result<String, AuthError> {
        self.credentials
            .iter()
            .find(|(id, _)| id == access_key_id)
            .map(|(_, secret)| secret.clone())
            .ok_or_else(|| AuthError::UnknownAccessKey(access_key_id.to_owned()))
    }
}
