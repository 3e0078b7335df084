//! Payload envelope and JSON wire format.
//!
//! A [`Payload`] is the unit every transform stage operates on: a metadata
//! map of string keys to raw bytes plus an opaque data blob. The wire
//! format is the workflow-engine SDK's JSON convention - byte fields are
//! standard base64 strings:
//!
//! ```json
//! {
//!   "payloads": [
//!     {
//!       "metadata": {"encoding": "anNvbi9wbGFpbg=="},
//!       "data": "ImhlbGxvIg=="
//!     }
//!   ]
//! }
//! ```
//!
//! An envelope is either fully plain (no encrypted-encoding tag, `data`
//! holds the original serialized form) or fully encrypted (tag present,
//! `data` is ciphertext, key id present). Stages never produce a partially
//! transformed envelope.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata key naming the current representation of `data`.
pub const METADATA_ENCODING: &str = "encoding";

/// `encoding` value marking an envelope as encryption-transformed.
pub const ENCODING_ENCRYPTED: &[u8] = b"binary/encrypted";

/// Metadata key carrying the KMS key id used to produce `data`.
pub const METADATA_ENCRYPTION_KEY_ID: &str = "encryption-key-id";

/// Metadata key carrying the KMS-reported key version. Audit only;
/// decryption does not require it.
pub const METADATA_ENCRYPTION_KEY_VERSION: &str = "encryption-key-version";

/// A single payload envelope: self-describing metadata plus opaque bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Metadata tags consumed by stages. Keys unique, order irrelevant.
    #[serde(default, skip_serializing_if = "HashMap::is_empty", with = "b64_map")]
    pub metadata: HashMap<String, Vec<u8>>,

    /// Opaque byte sequence - raw serialized content or a transformed
    /// representation.
    #[serde(default, with = "b64")]
    pub data: Vec<u8>,
}

impl Payload {
    /// Create a plain envelope with empty metadata.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            metadata: HashMap::new(),
            data: data.into(),
        }
    }

    /// True when the envelope carries `encoding == binary/encrypted`.
    pub fn is_encrypted(&self) -> bool {
        self.metadata
            .get(METADATA_ENCODING)
            .is_some_and(|v| v == ENCODING_ENCRYPTED)
    }

    /// The KMS key id recorded at encryption time, if any.
    pub fn encryption_key_id(&self) -> Option<&[u8]> {
        self.metadata
            .get(METADATA_ENCRYPTION_KEY_ID)
            .map(Vec::as_slice)
    }

    /// Serialize the whole envelope to its JSON byte form.
    ///
    /// This is what the encryption stage feeds to the KMS, so the
    /// ciphertext encapsulates metadata and data as one unit.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize an envelope from its JSON byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A batch of payload envelopes - the request and response body of the
/// encode/decode endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadBatch {
    /// The envelopes, in order. Order is preserved by every stage.
    #[serde(default)]
    pub payloads: Vec<Payload>,
}

impl PayloadBatch {
    /// Wrap a list of envelopes.
    pub fn new(payloads: Vec<Payload>) -> Self {
        Self { payloads }
    }
}

mod b64 {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(&encoded).map_err(serde::de::Error::custom)
    }
}

mod b64_map {
    use std::collections::HashMap;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        map: &HashMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(map.iter().map(|(k, v)| (k, BASE64.encode(v))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<String, Vec<u8>>, D::Error> {
        let encoded = HashMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(k, v)| {
                BASE64
                    .decode(&v)
                    .map(|bytes| (k, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
