//! Bearer token acquisition for Azure Resource Manager.
//!
//! [`AmbientCredential`] resolves credentials the way the Azure SDKs do
//! (environment service principal, managed identity, Azure CLI).
//! [`StaticToken`] hands out a fixed token and is meant for tests.

use crate::config;
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_identity::DefaultAzureCredential;
use std::error::Error;
use std::sync::Arc;

/// Source of bearer tokens for ARM requests.
#[async_trait(?Send)]
pub trait TokenSource {
    async fn token(&self) -> Result<String, Box<dyn Error>>;
}

/// Credential chain picked by `azure_identity` from the environment.
pub struct AmbientCredential {
    credential: Arc<dyn TokenCredential>,
}

impl AmbientCredential {
    /// Credential lookup is lazy; nothing is contacted until the first token request.
    pub fn new() -> AmbientCredential {
        let credential: Arc<dyn TokenCredential> = Arc::new(DefaultAzureCredential::default());
        AmbientCredential { credential }
    }
}

impl Default for AmbientCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TokenSource for AmbientCredential {
    async fn token(&self) -> Result<String, Box<dyn Error>> {
        let access_token = self
            .credential
            .get_token(&[config::ARM_SCOPE])
            .await
            .map_err(|e| {
                log::error!("Token request failed: {e}");
                format!("Error acquiring ARM token (try `az login`): {e}")
            })?;
        log::trace!("Got ARM token, expires_on={}", access_token.expires_on);
        Ok(access_token.token.secret().to_string())
    }
}

/// Fixed token.
pub struct StaticToken(pub String);

#[async_trait(?Send)]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.0.clone())
    }
}
