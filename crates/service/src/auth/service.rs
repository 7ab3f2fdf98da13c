use store::Store;
use tracing::{info, instrument, warn};

use super::domain::{Credential, PresentedCredential, ProvisionReport};
use super::errors::AuthError;
use super::registry;

/// Token issuing and provisioning, independent of the web framework.
#[derive(Clone)]
pub struct AuthService {
    store: Store,
}

impl AuthService {
    pub fn new(store: Store) -> Self { Self { store } }

    /// Ensure every credential owns a token. Fatal to startup on error.
    #[instrument(skip_all, fields(count = credentials.len()))]
    pub async fn provision(&self, credentials: Vec<Credential>) -> Result<ProvisionReport, AuthError> {
        let store = self.store.clone();
        let report = tokio::task::spawn_blocking(move || registry::provision(&store, &credentials)).await??;
        info!(created = report.created, existing = report.existing, "credentials provisioned");
        Ok(report)
    }

    /// Exchange a raw `{username, password}` body for its base64 token.
    ///
    /// The body must decode as a credential before the store is touched; the
    /// lookup itself compares the raw JSON structurally against the registry.
    #[instrument(skip_all)]
    pub async fn issue_token(&self, body: Vec<u8>) -> Result<String, AuthError> {
        let credential: PresentedCredential =
            serde_json::from_slice(&body).map_err(|e| AuthError::InvalidBody(e.to_string()))?;

        let store = self.store.clone();
        let token = tokio::task::spawn_blocking(move || registry::lookup_token(&store, &body)).await??;
        match token {
            Some(token) => {
                info!(username = %credential.username, "token_issued");
                Ok(token.encode())
            }
            None => {
                warn!(username = %credential.username, "authentication failed");
                Err(AuthError::Unauthorized)
            }
        }
    }
}
