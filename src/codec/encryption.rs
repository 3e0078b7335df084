//! KMS-backed encryption stage.
//!
//! Encode serializes each envelope to bytes, encrypts those bytes under the
//! stage's configured key id, and replaces the envelope with a fresh wrapper
//! carrying exactly three metadata keys. Decode is asymmetric: envelopes not
//! tagged `binary/encrypted` pass through unchanged, which keeps mixed
//! plain/encrypted batches and repeated decodes safe. For tagged envelopes
//! the key id always comes from the envelope's own metadata, never from the
//! stage configuration, so any chain can decrypt payloads encrypted under
//! any key the KMS recognizes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, TransitError};
use crate::kms::KmsClient;
use crate::payload::{
    Payload, ENCODING_ENCRYPTED, METADATA_ENCODING, METADATA_ENCRYPTION_KEY_ID,
    METADATA_ENCRYPTION_KEY_VERSION,
};

/// Encryption stage bound to a KMS key id.
pub struct EncryptionStage {
    kms: Arc<dyn KmsClient>,
    key_id: String,
}

impl EncryptionStage {
    /// Create a stage encrypting under the given key id.
    pub fn new(kms: Arc<dyn KmsClient>, key_id: impl Into<String>) -> Self {
        Self {
            kms,
            key_id: key_id.into(),
        }
    }

    /// The key id new ciphertexts are produced under.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Encrypt every envelope, replacing each with a fresh encrypted
    /// wrapper. Prior metadata travels inside the ciphertext, not on the
    /// wrapper.
    pub async fn encode(&self, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
        let mut result = Vec::with_capacity(payloads.len());

        for payload in payloads {
            let plaintext = payload
                .to_bytes()
                .map_err(|e| TransitError::Transform(format!("error marshaling payload: {e}")))?;

            let encrypted = self.kms.encrypt(&self.key_id, &plaintext).await?;

            let mut metadata = HashMap::with_capacity(3);
            metadata.insert(METADATA_ENCODING.to_string(), ENCODING_ENCRYPTED.to_vec());
            metadata.insert(
                METADATA_ENCRYPTION_KEY_VERSION.to_string(),
                encrypted.key_version.to_string().into_bytes(),
            );
            metadata.insert(
                METADATA_ENCRYPTION_KEY_ID.to_string(),
                self.key_id.clone().into_bytes(),
            );

            result.push(Payload {
                metadata,
                data: encrypted.ciphertext,
            });
        }

        Ok(result)
    }

    /// Decrypt tagged envelopes back into their original form; untagged
    /// envelopes pass through unchanged.
    pub async fn decode(&self, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
        let mut result = Vec::with_capacity(payloads.len());

        for payload in payloads {
            if !payload.is_encrypted() {
                result.push(payload);
                continue;
            }

            let key_id = payload
                .encryption_key_id()
                .ok_or_else(|| TransitError::Transform("no encryption key id".to_string()))?;
            let key_id = std::str::from_utf8(key_id).map_err(|_| {
                TransitError::Transform("encryption key id is not valid UTF-8".to_string())
            })?;

            let plaintext = self.kms.decrypt(key_id, &payload.data).await?;

            let restored = Payload::from_bytes(&plaintext)
                .map_err(|e| TransitError::Transform(format!("error unmarshaling payload: {e}")))?;
            result.push(restored);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kms::testing::MockKms;

    fn stage(key_id: &str) -> (Arc<MockKms>, EncryptionStage) {
        let kms = Arc::new(MockKms::new());
        let stage = EncryptionStage::new(kms.clone(), key_id);
        (kms, stage)
    }

    #[tokio::test]
    async fn test_encode_metadata_completeness() {
        let (_, stage) = stage("default");
        let mut payload = Payload::new(b"hello".to_vec());
        payload
            .metadata
            .insert("custom-tag".to_string(), b"kept inside".to_vec());

        let encoded = stage.encode(vec![payload]).await.unwrap();
        let encrypted = &encoded[0];

        // Exactly the three defined keys; prior metadata is discarded from
        // the wrapper.
        assert_eq!(encrypted.metadata.len(), 3);
        assert_eq!(
            encrypted.metadata.get(METADATA_ENCODING).unwrap(),
            ENCODING_ENCRYPTED
        );
        assert_eq!(
            encrypted.metadata.get(METADATA_ENCRYPTION_KEY_ID).unwrap(),
            b"default"
        );
        assert_eq!(
            encrypted
                .metadata
                .get(METADATA_ENCRYPTION_KEY_VERSION)
                .unwrap(),
            b"1"
        );
        assert!(encrypted.is_encrypted());
        assert_ne!(encrypted.data, b"hello");
    }

    #[tokio::test]
    async fn test_roundtrip_restores_original_envelope() {
        let (_, stage) = stage("default");
        let mut payload = Payload::new(b"hello".to_vec());
        payload
            .metadata
            .insert("custom-tag".to_string(), b"survives".to_vec());

        let encoded = stage.encode(vec![payload.clone()]).await.unwrap();
        let decoded = stage.decode(encoded).await.unwrap();

        assert_eq!(decoded, vec![payload]);
    }

    #[tokio::test]
    async fn test_decode_plain_passthrough() {
        let (kms, stage) = stage("default");
        let payload = Payload::new(b"never encrypted".to_vec());

        let decoded = stage.decode(vec![payload.clone()]).await.unwrap();
        assert_eq!(decoded, vec![payload]);
        // No KMS round trip for pass-through envelopes.
        assert_eq!(kms.call_count(), 0);
    }

    #[tokio::test]
    async fn test_decode_mixed_batch_preserves_order() {
        let (_, stage) = stage("default");
        let plain = Payload::new(b"plain".to_vec());
        let encrypted = stage
            .encode(vec![Payload::new(b"secret".to_vec())])
            .await
            .unwrap()
            .remove(0);

        let decoded = stage
            .decode(vec![plain.clone(), encrypted, plain.clone()])
            .await
            .unwrap();

        assert_eq!(decoded[0], plain);
        assert_eq!(decoded[1].data, b"secret");
        assert_eq!(decoded[2], plain);
    }

    #[tokio::test]
    async fn test_decode_missing_key_id_fails() {
        let (_, stage) = stage("default");
        let mut payload = Payload::new(b"vault:default:xxxx".to_vec());
        payload
            .metadata
            .insert(METADATA_ENCODING.to_string(), ENCODING_ENCRYPTED.to_vec());

        let err = stage.decode(vec![payload]).await.unwrap_err();
        assert!(err.to_string().contains("no encryption key id"));
    }

    #[tokio::test]
    async fn test_decode_key_id_comes_from_envelope() {
        // Encrypt under "default", decode through a stage configured for
        // "spread": succeeds because the envelope carries the key id.
        let (_, default_stage) = stage("default");
        let encoded = default_stage
            .encode(vec![Payload::new(b"hello".to_vec())])
            .await
            .unwrap();

        let (_, spread_stage) = stage("spread");
        let decoded = spread_stage.decode(encoded).await.unwrap();
        assert_eq!(decoded[0].data, b"hello");
    }
}
