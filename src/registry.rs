//! Namespace registry.
//!
//! Maps a tenant namespace to its codec chain. Built once at startup from
//! the configured namespace list and read-only for the server's lifetime,
//! so concurrent requests resolve chains without locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::CodecChain;
use crate::kms::KmsClient;

/// Immutable mapping from namespace name to codec chain.
pub struct NamespaceRegistry {
    chains: HashMap<String, Arc<CodecChain>>,
}

impl NamespaceRegistry {
    /// Build a registry over the given namespaces, each bound to the
    /// standard chain (encryption keyed by the namespace name, then
    /// compression).
    pub fn new<S: AsRef<str>>(kms: Arc<dyn KmsClient>, namespaces: &[S]) -> Self {
        let chains = namespaces
            .iter()
            .map(|namespace| {
                let namespace = namespace.as_ref();
                (
                    namespace.to_string(),
                    Arc::new(CodecChain::for_namespace(kms.clone(), namespace)),
                )
            })
            .collect();

        Self { chains }
    }

    /// Resolve the chain for a namespace.
    pub fn chain(&self, namespace: &str) -> Option<Arc<CodecChain>> {
        self.chains.get(namespace).cloned()
    }

    /// True when the namespace is registered.
    pub fn contains(&self, namespace: &str) -> bool {
        self.chains.contains_key(namespace)
    }

    /// Registered namespace names, in no particular order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Number of registered namespaces.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True when no namespaces are registered.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
