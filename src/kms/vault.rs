//! Vault transit-engine KMS client.
//!
//! Speaks the transit secrets engine's HTTP API:
//!
//! ```text
//! POST {addr}/v1/transit/encrypt/{key}   {"plaintext": "<base64>"}
//!   -> {"data": {"ciphertext": "vault:v1:...", "key_version": 1}}
//! POST {addr}/v1/transit/decrypt/{key}   {"ciphertext": "vault:v1:..."}
//!   -> {"data": {"plaintext": "<base64>"}}
//! ```
//!
//! Configured from the conventional environment variables (`VAULT_ADDR`,
//! `VAULT_TOKEN`). Each encrypt/decrypt call is one network round trip;
//! there is no retry logic - a failed call fails the whole request.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{EncryptOutput, KmsClient};
use crate::error::{Result, TransitError};

/// Address used when `VAULT_ADDR` is unset, matching the Vault client
/// library default.
const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Mount path of the transit secrets engine.
const TRANSIT_MOUNT: &str = "transit";

/// HTTP client for Vault's transit secrets engine.
pub struct VaultTransitClient {
    http: reqwest::Client,
    addr: String,
    token: String,
}

#[derive(Serialize)]
struct EncryptRequest {
    plaintext: String,
}

#[derive(Serialize)]
struct DecryptRequest {
    ciphertext: String,
}

#[derive(Deserialize)]
struct TransitResponse {
    #[serde(default)]
    data: TransitData,
}

#[derive(Default, Deserialize)]
struct TransitData {
    ciphertext: Option<String>,
    key_version: Option<u64>,
    plaintext: Option<String>,
}

impl VaultTransitClient {
    /// Build a client for the given Vault address and token.
    pub fn new(addr: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransitError::Kms(format!("Failed to create HTTP client: {e}")))?;

        let mut addr = addr.into();
        while addr.ends_with('/') {
            addr.pop();
        }

        Ok(Self {
            http,
            addr,
            token: token.into(),
        })
    }

    /// Build a client from `VAULT_ADDR` and `VAULT_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let addr =
            std::env::var("VAULT_ADDR").unwrap_or_else(|_| DEFAULT_VAULT_ADDR.to_string());
        let token = std::env::var("VAULT_TOKEN").unwrap_or_default();
        Self::new(addr, token)
    }

    fn endpoint(&self, operation: &str, key_id: &str) -> String {
        format!("{}/v1/{TRANSIT_MOUNT}/{operation}/{key_id}", self.addr)
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<TransitData> {
        let response = self
            .http
            .post(url)
            .header("X-Vault-Token", &self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TransitError::Kms(format!(
                "transit request failed with {status}: {detail}"
            )));
        }

        let parsed: TransitResponse = response
            .json()
            .await
            .map_err(|e| TransitError::Kms(format!("invalid transit response: {e}")))?;
        Ok(parsed.data)
    }
}

/// Convert an encrypt response body into an [`EncryptOutput`], rejecting
/// responses that omit ciphertext or key version.
fn encrypt_output(data: TransitData) -> Result<EncryptOutput> {
    let ciphertext = data
        .ciphertext
        .ok_or_else(|| TransitError::Kms("no ciphertext returned".to_string()))?;
    let key_version = data
        .key_version
        .ok_or_else(|| TransitError::Kms("no key_version returned".to_string()))?;

    Ok(EncryptOutput {
        ciphertext: ciphertext.into_bytes(),
        key_version,
    })
}

/// Extract and decode the base64 plaintext from a decrypt response body.
fn decrypt_output(data: TransitData) -> Result<Vec<u8>> {
    let encoded = data
        .plaintext
        .ok_or_else(|| TransitError::Kms("no plaintext returned".to_string()))?;
    BASE64
        .decode(&encoded)
        .map_err(|e| TransitError::Kms(format!("error decoding base64 plaintext: {e}")))
}

#[async_trait]
impl KmsClient for VaultTransitClient {
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<EncryptOutput> {
        let body = EncryptRequest {
            plaintext: BASE64.encode(plaintext),
        };
        let data = self.post(&self.endpoint("encrypt", key_id), &body).await?;
        encrypt_output(data)
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let ciphertext = std::str::from_utf8(ciphertext)
            .map_err(|_| TransitError::Kms("ciphertext is not valid UTF-8".to_string()))?;
        let body = DecryptRequest {
            ciphertext: ciphertext.to_string(),
        };
        let data = self.post(&self.endpoint("decrypt", key_id), &body).await?;
        decrypt_output(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_layout() {
        let client = VaultTransitClient::new("http://vault:8200/", "token").unwrap();
        assert_eq!(
            client.endpoint("encrypt", "default"),
            "http://vault:8200/v1/transit/encrypt/default"
        );
        assert_eq!(
            client.endpoint("decrypt", "spread"),
            "http://vault:8200/v1/transit/decrypt/spread"
        );
    }

    #[test]
    fn test_encrypt_output_complete() {
        let data = TransitData {
            ciphertext: Some("vault:v2:abc".to_string()),
            key_version: Some(2),
            plaintext: None,
        };
        let out = encrypt_output(data).unwrap();
        assert_eq!(out.ciphertext, b"vault:v2:abc");
        assert_eq!(out.key_version, 2);
    }

    #[test]
    fn test_encrypt_output_missing_fields() {
        let missing_ct = TransitData {
            ciphertext: None,
            key_version: Some(1),
            plaintext: None,
        };
        let err = encrypt_output(missing_ct).unwrap_err();
        assert!(err.to_string().contains("no ciphertext returned"));

        let missing_version = TransitData {
            ciphertext: Some("vault:v1:abc".to_string()),
            key_version: None,
            plaintext: None,
        };
        let err = encrypt_output(missing_version).unwrap_err();
        assert!(err.to_string().contains("no key_version returned"));
    }

    #[test]
    fn test_decrypt_output() {
        let data = TransitData {
            ciphertext: None,
            key_version: None,
            plaintext: Some("aGVsbG8=".to_string()),
        };
        assert_eq!(decrypt_output(data).unwrap(), b"hello");

        let empty = TransitData::default();
        let err = decrypt_output(empty).unwrap_err();
        assert!(err.to_string().contains("no plaintext returned"));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"data":{"ciphertext":"vault:v1:xyz","key_version":1}}"#;
        let parsed: TransitResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.ciphertext.as_deref(), Some("vault:v1:xyz"));
        assert_eq!(parsed.data.key_version, Some(1));
    }
}
