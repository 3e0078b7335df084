//! Reversible transform stages and their composition.
//!
//! A [`Stage`] is one reversible unit operating on a sequence of payload
//! envelopes; a [`CodecChain`] is an ordered composition of stages bound to
//! a namespace. Encode applies stages front-to-back, decode back-to-front,
//! so the outer representation seen on the wire is always the last stage's
//! output:
//!
//! ```text
//! encode:  plain --[encrypt]--> ciphertext --[compress]--> wire bytes
//! decode:  wire bytes --[inflate]--> ciphertext --[decrypt]--> plain
//! ```
//!
//! The stage set is a closed set of tagged variants behind a uniform
//! encode/decode contract; new stages extend the enum.

mod chain;
mod compression;
mod encryption;

pub use chain::CodecChain;
pub use compression::CompressionStage;
pub use encryption::EncryptionStage;

use crate::error::Result;
use crate::payload::Payload;

/// One reversible transform in a chain.
pub enum Stage {
    /// KMS-backed encryption of whole envelopes.
    Encryption(EncryptionStage),
    /// Zlib compression of envelope data.
    Compression(CompressionStage),
}

impl Stage {
    /// Apply the stage's forward transform to every envelope in order.
    pub async fn encode(&self, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
        match self {
            Stage::Encryption(stage) => stage.encode(payloads).await,
            Stage::Compression(stage) => stage.encode(payloads),
        }
    }

    /// Apply the stage's inverse transform to every envelope in order.
    pub async fn decode(&self, payloads: Vec<Payload>) -> Result<Vec<Payload>> {
        match self {
            Stage::Encryption(stage) => stage.decode(payloads).await,
            Stage::Compression(stage) => stage.decode(payloads),
        }
    }

    /// Human-readable stage name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Encryption(_) => "encryption",
            Stage::Compression(_) => "compression",
        }
    }
}
