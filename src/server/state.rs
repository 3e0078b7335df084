//! Server state.

use std::sync::Arc;

use super::config::ServerConfig;
use crate::auth::Authorizer;
use crate::error::Result;
use crate::kms::KmsClient;
use crate::registry::NamespaceRegistry;

/// Application state shared across handlers.
///
/// Everything here is immutable after startup; arbitrarily many concurrent
/// requests read it without locking. The KMS client inside the registry's
/// chains is the only shared resource touched per request.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Namespace -> codec chain, built once
    pub registry: NamespaceRegistry,
    /// Authorization gate; `None` means disabled (all requests pass)
    pub authorizer: Option<Arc<dyn Authorizer>>,
}

impl AppState {
    /// Validate the configuration and build the registry over it.
    pub fn new(config: ServerConfig, kms: Arc<dyn KmsClient>) -> Result<Self> {
        config.validate()?;
        let registry = NamespaceRegistry::new(kms, &config.namespaces);

        Ok(Self {
            config,
            registry,
            authorizer: None,
        })
    }

    /// Enable the authorization gate.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }
}
