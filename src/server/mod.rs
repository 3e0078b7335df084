//! Remote codec HTTP server.
//!
//! Wires the namespace registry, authorization gate, and codec chains
//! behind the workflow-engine remote codec HTTP protocol.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use transit::kms::VaultTransitClient;
//! use transit::server::{create_router, AppState, ServerConfig};
//!
//! let config = ServerConfig::default().with_port(8081);
//! let kms = Arc::new(VaultTransitClient::from_env()?);
//! let state = Arc::new(AppState::new(config, kms)?);
//! let app = create_router(state)?;
//! ```

mod config;
mod handlers;
mod state;

pub use config::ServerConfig;
pub use handlers::{create_router, NAMESPACE_HEADER};
pub use state::AppState;
