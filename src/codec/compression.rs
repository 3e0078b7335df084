//! Zlib compression stage.
//!
//! Always compresses on encode - even payloads that grow slightly - trading
//! a little overhead for deterministic behavior. The zlib stream is
//! self-describing, so decode needs no metadata tag and attempts inflation
//! unconditionally; this stage never touches envelope metadata.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Result, TransitError};
use crate::payload::Payload;

/// Zlib compression stage
#[derive(Debug, Clone)]
pub struct CompressionStage {
    level: Compression,
}

impl Default for CompressionStage {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl CompressionStage {
    /// Create a stage with the default compression level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stage with a specific compression level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    /// Compress bytes to a zlib stream.
    pub fn compress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(data)
            .map_err(|e| TransitError::Transform(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| TransitError::Transform(e.to_string()))
    }

    /// Inflate a zlib stream.
    pub fn decompress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| TransitError::Transform(format!("invalid zlib stream: {e}")))?;
        Ok(decompressed)
    }

    /// Replace every envelope's data with its compressed form.
    pub fn encode(&self, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
        payloads
            .into_iter()
            .map(|mut payload| {
                payload.data = self.compress_bytes(&payload.data)?;
                Ok(payload)
            })
            .collect()
    }

    /// Replace every envelope's data with its inflated form.
    pub fn decode(&self, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
        payloads
            .into_iter()
            .map(|mut payload| {
                payload.data = self.decompress_bytes(&payload.data)?;
                Ok(payload)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_roundtrip() {
        let stage = CompressionStage::new();
        let original = b"Hello, zlib! This is a test of byte compression.";

        let compressed = stage.compress_bytes(original).unwrap();
        let decompressed = stage.decompress_bytes(&compressed).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_always_encodes_small_payloads() {
        let stage = CompressionStage::new();
        let payloads = vec![Payload::new(b"hi".to_vec())];

        // Always-encode policy: even a two-byte payload gets compressed.
        let encoded = stage.encode(payloads).unwrap();
        assert_ne!(encoded[0].data, b"hi");

        let decoded = stage.decode(encoded).unwrap();
        assert_eq!(decoded[0].data, b"hi");
    }

    #[test]
    fn test_metadata_untouched() {
        let stage = CompressionStage::new();
        let mut payload = Payload::new(b"payload body".to_vec());
        payload
            .metadata
            .insert("encoding".to_string(), b"json/plain".to_vec());
        let metadata = payload.metadata.clone();

        let encoded = stage.encode(vec![payload]).unwrap();
        assert_eq!(encoded[0].metadata, metadata);

        let decoded = stage.decode(encoded).unwrap();
        assert_eq!(decoded[0].metadata, metadata);
    }

    #[test]
    fn test_invalid_stream_fails() {
        let stage = CompressionStage::new();
        let payloads = vec![Payload::new(b"not a zlib stream".to_vec())];

        let err = stage.decode(payloads).unwrap_err();
        assert!(err.to_string().contains("invalid zlib stream"));
    }

    #[test]
    fn test_order_preserved() {
        let stage = CompressionStage::new();
        let payloads = vec![
            Payload::new(b"first".to_vec()),
            Payload::new(b"second".to_vec()),
            Payload::new(b"third".to_vec()),
        ];

        let decoded = stage.decode(stage.encode(payloads).unwrap()).unwrap();
        assert_eq!(decoded[0].data, b"first");
        assert_eq!(decoded[1].data, b"second");
        assert_eq!(decoded[2].data, b"third");
    }
}
