//! Server configuration.
//!
//! One explicit immutable struct built at startup and passed into the
//! state and router constructors. Request handling never reads ambient
//! global state.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Result, TransitError};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Namespaces to build codec chains for
    pub namespaces: Vec<String>,
    /// TLS certificate file (both-or-neither with the key file)
    pub tls_cert_file: Option<PathBuf>,
    /// TLS private key file
    pub tls_key_file: Option<PathBuf>,
    /// OIDC issuer URL; set enables the authorization gate
    pub oidc_issuer: Option<String>,
    /// OIDC audience, enforced when set
    pub oidc_audience: Option<String>,
    /// Allowed CORS origin; set enables the CORS wrapper
    pub cors_origin: Option<String>,
    /// Debug logging toggle
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            namespaces: vec!["default".to_string(), "spread".to_string()],
            tls_cert_file: None,
            tls_key_file: None,
            oidc_issuer: None,
            oidc_audience: None,
            cors_origin: None,
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Create with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr = SocketAddr::from((self.addr.ip(), port));
        self
    }

    /// Set address directly
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set the namespace list
    pub fn with_namespaces<S: Into<String>>(
        mut self,
        namespaces: impl IntoIterator<Item = S>,
    ) -> Self {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Set the TLS certificate/key file pair
    pub fn with_tls(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.tls_cert_file = Some(cert.into());
        self.tls_key_file = Some(key.into());
        self
    }

    /// Enable the authorization gate against an OIDC issuer
    pub fn with_oidc_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.oidc_issuer = Some(issuer.into());
        self
    }

    /// Require an OIDC audience
    pub fn with_oidc_audience(mut self, audience: impl Into<String>) -> Self {
        self.oidc_audience = Some(audience.into());
        self
    }

    /// Enable CORS for an allowed origin
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = Some(origin.into());
        self
    }

    /// Enable debug logging
    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// The TLS file pair when TLS is configured.
    pub fn tls_files(&self) -> Option<(&Path, &Path)> {
        match (&self.tls_cert_file, &self.tls_key_file) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }

    /// Validate startup inputs. Fatal before serving on failure.
    pub fn validate(&self) -> Result<()> {
        if self.tls_cert_file.is_some() != self.tls_key_file.is_some() {
            return Err(TransitError::Config(
                "Both TLS cert and key must be provided if either is specified".to_string(),
            ));
        }

        if self.namespaces.is_empty() {
            return Err(TransitError::Config(
                "at least one namespace must be configured".to_string(),
            ));
        }

        if self.oidc_audience.is_some() && self.oidc_issuer.is_none() {
            return Err(TransitError::Config(
                "OIDC audience requires an OIDC issuer".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.addr.port(), 8081);
        assert_eq!(config.namespaces, vec!["default", "spread"]);
    }

    #[test]
    fn test_tls_both_or_neither() {
        let cert_only = ServerConfig {
            tls_cert_file: Some("/tls/server.crt".into()),
            ..Default::default()
        };
        assert!(cert_only.validate().is_err());

        let key_only = ServerConfig {
            tls_key_file: Some("/tls/server.key".into()),
            ..Default::default()
        };
        assert!(key_only.validate().is_err());

        let both = ServerConfig::default().with_tls("/tls/server.crt", "/tls/server.key");
        assert!(both.validate().is_ok());
        assert!(both.tls_files().is_some());
    }

    #[test]
    fn test_empty_namespaces_rejected() {
        let config = ServerConfig::default().with_namespaces(Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_audience_requires_issuer() {
        let audience_only = ServerConfig::default().with_oidc_audience("codec-server");
        assert!(audience_only.validate().is_err());

        let both = ServerConfig::default()
            .with_oidc_issuer("https://issuer.example.com")
            .with_oidc_audience("codec-server");
        assert!(both.validate().is_ok());
    }
}
