//! Key-management service client contract.
//!
//! The KMS performs the actual cryptography; this crate only consumes its
//! call contract: `encrypt(key_id, plaintext) -> (ciphertext, key_version)`
//! and `decrypt(key_id, ciphertext) -> plaintext`. The trait seam exists so
//! the encryption stage can run against the real Vault transit engine in
//! production and an in-process fake in tests.
//!
//! The client is the only shared resource touched per request; it must
//! tolerate arbitrarily many concurrent independent calls.

mod vault;

pub use vault::VaultTransitClient;

use async_trait::async_trait;

use crate::error::Result;

/// Result of a KMS encrypt call.
#[derive(Debug, Clone)]
pub struct EncryptOutput {
    /// The ciphertext, opaque to this crate.
    pub ciphertext: Vec<u8>,
    /// Version of the key that produced the ciphertext, as reported by
    /// the KMS. Carried in envelope metadata for audit and rotation.
    pub key_version: u64,
}

/// External key-management service call contract.
#[async_trait]
pub trait KmsClient: Send + Sync {
    /// Encrypt `plaintext` under the named key.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<EncryptOutput>;

    /// Decrypt `ciphertext` under the named key.
    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>>;
}
