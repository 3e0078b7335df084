//! # Transit Codec - Remote Payload Codec Server
//!
//! A remote payload-transformation service for workflow-engine clients.
//! Opaque payload envelopes are run through a per-tenant ("namespace")
//! chain of reversible transform stages - encryption via an external
//! key-management service, then zlib compression - and the reverse path
//! applies the exact inverse in reverse order, skipping inapplicable
//! stages based on self-describing envelope metadata.
//!
//! ## Architecture
//!
//! ```text
//! client                 transit-codec                 Vault (transit)
//!   |                         |                              |
//!   |-- POST /default/encode->|                              |
//!   |                         |-- encrypt(key, envelope) --->|
//!   |                         |<-- ciphertext, key version --|
//!   |                         |   zlib compress              |
//!   |<-- transformed batch ---|                              |
//!   |                         |                              |
//!   |-- POST /default/decode->|   zlib inflate               |
//!   |                         |-- decrypt(key, ciphertext)-->|
//!   |<-- original batch ------|                              |
//! ```
//!
//! Encode applies stages front-to-back, decode back-to-front; a chain of
//! `[Encryption, Compression]` encodes encrypt then compress and decodes
//! decompress then decrypt. Envelopes not tagged `binary/encrypted` pass
//! through the encryption stage's decode unchanged, so mixed
//! plain/encrypted batches are safe.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use transit::codec::CodecChain;
//! use transit::kms::VaultTransitClient;
//! use transit::payload::Payload;
//!
//! let kms = Arc::new(VaultTransitClient::from_env()?);
//! let chain = CodecChain::for_namespace(kms, "default");
//!
//! let encoded = chain.encode(vec![Payload::new(b"hello".to_vec())]).await?;
//! let decoded = chain.decode(encoded).await?;
//! assert_eq!(decoded[0].data, b"hello");
//! ```
//!
//! ## Modules
//!
//! - [`payload`]: payload envelope and JSON wire format
//! - [`codec`]: transform stages and chain composition
//! - [`registry`]: namespace-to-chain resolution
//! - [`kms`]: external key-management service client
//! - [`auth`]: authorization gate (OIDC)
//! - [`server`]: HTTP API server (Axum-based)
//! - [`error`]: error types and result alias

pub mod auth;
pub mod codec;
pub mod error;
pub mod kms;
pub mod payload;
pub mod registry;
pub mod server;

// Re-exports for convenience
pub use auth::{Authorizer, OidcProvider};
pub use codec::{CodecChain, CompressionStage, EncryptionStage, Stage};
pub use error::{Result, TransitError};
pub use kms::{EncryptOutput, KmsClient, VaultTransitClient};
pub use payload::{Payload, PayloadBatch};
pub use registry::NamespaceRegistry;
pub use server::{AppState, ServerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
