//! Authorization gate.
//!
//! Optional per-namespace decorator in front of the codec chains. The gate
//! has two states: disabled (no provider configured, all requests pass) and
//! enabled (an OIDC issuer and optional audience configured). Token
//! validation itself is an external collaborator; the gate's contract is
//! only `authorize(namespace, credential) -> bool`, and a denied request
//! never reaches a transform stage.

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use serde_json::Value;

use crate::error::{Result, TransitError};

/// Boolean authorization decision for a namespace-scoped request.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// True when the bearer credential is valid for the namespace.
    async fn authorize(&self, namespace: &str, bearer: Option<&str>) -> bool;
}

/// Extract the bearer credential from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// OIDC-backed authorizer.
///
/// Discovers the provider's userinfo endpoint at startup and validates
/// tokens by presenting them there; the issuer performs the signature
/// checks. Audience and namespace scoping are enforced against the
/// returned claims.
pub struct OidcProvider {
    issuer: String,
    audience: Option<String>,
    userinfo_endpoint: String,
    http: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct DiscoveryDocument {
    userinfo_endpoint: String,
}

impl OidcProvider {
    /// Discover the provider configuration for an issuer URL.
    pub async fn discover(issuer: &str) -> Result<Self> {
        let issuer = issuer.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransitError::Config(format!("Failed to create HTTP client: {e}")))?;

        let url = format!("{issuer}/.well-known/openid-configuration");
        let response = http
            .get(&url)
            .send()
            .await
            .map_err(|e| TransitError::Config(format!("OIDC discovery failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TransitError::Config(format!(
                "OIDC discovery failed with {}",
                response.status()
            )));
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| TransitError::Config(format!("invalid OIDC discovery document: {e}")))?;

        Ok(Self {
            issuer,
            audience: None,
            userinfo_endpoint: document.userinfo_endpoint,
            http,
        })
    }

    /// Require tokens to carry this audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// The issuer this provider validates against.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The configured audience, if any.
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }
}

#[async_trait]
impl Authorizer for OidcProvider {
    async fn authorize(&self, namespace: &str, bearer: Option<&str>) -> bool {
        let Some(token) = bearer else {
            return false;
        };

        let response = match self
            .http
            .get(&self.userinfo_endpoint)
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("userinfo request failed: {e}");
                return false;
            },
        };

        if !response.status().is_success() {
            return false;
        }

        let claims: Value = match response.json().await {
            Ok(claims) => claims,
            Err(_) => return false,
        };

        claims_permit(&claims, self.audience.as_deref(), namespace)
    }
}

/// Check validated claims against the configured audience and the request
/// namespace.
///
/// Audience must match when configured (string or array `aud`). A
/// `namespaces` claim, when present, must contain the request namespace;
/// tokens without one are valid for every namespace.
fn claims_permit(claims: &Value, audience: Option<&str>, namespace: &str) -> bool {
    if let Some(audience) = audience {
        let aud_ok = match claims.get("aud") {
            Some(Value::String(aud)) => aud == audience,
            Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(audience)),
            _ => false,
        };
        if !aud_ok {
            return false;
        }
    }

    match claims.get("namespaces") {
        Some(Value::Array(namespaces)) => {
            namespaces.iter().any(|n| n.as_str() == Some(namespace))
        }
        Some(_) => false,
        None => true,
    }
}
