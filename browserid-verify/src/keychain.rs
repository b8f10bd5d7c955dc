//! Issuer public key loading
//!
//! Local key sources are consulted in registration order. If every source
//! declines, the issuer's key is discovered over the network by following its
//! delegation chain.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::discovery::SupportDocumentFetcher;
use crate::resolver::DelegationResolver;
use crate::{Error, PublicKey, Result};

/// Answer from a local key source
#[derive(Debug, Clone)]
pub enum KeyLookup {
    Found(PublicKey),
    /// No opinion; the next source is tried
    Declined,
    /// Aborts the whole lookup
    Failed(Error),
}

#[async_trait]
pub trait KeySource: Send + Sync {
    async fn load(&self, issuer: &str) -> KeyLookup;
}

/// Keys configured ahead of time, by issuer domain
#[derive(Debug, Clone, Default)]
pub struct StaticKeySource {
    keys: HashMap<String, PublicKey>,
}

impl StaticKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, issuer: impl Into<String>, key: PublicKey) -> Self {
        self.keys.insert(issuer.into().to_ascii_lowercase(), key);
        self
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn load(&self, issuer: &str) -> KeyLookup {
        match self.keys.get(&issuer.to_ascii_lowercase()) {
            Some(key) => KeyLookup::Found(key.clone()),
            None => KeyLookup::Declined,
        }
    }
}

pub struct KeyChain<F> {
    sources: Vec<Arc<dyn KeySource>>,
    resolver: DelegationResolver<F>,
}

impl<F: SupportDocumentFetcher> KeyChain<F> {
    pub fn new(resolver: DelegationResolver<F>) -> Self {
        Self {
            sources: Vec::new(),
            resolver,
        }
    }

    /// Add a local source after those already registered
    pub fn register(&mut self, source: Arc<dyn KeySource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn KeySource>) -> Self {
        self.register(source);
        self
    }

    pub fn resolver(&self) -> &DelegationResolver<F> {
        &self.resolver
    }

    /// Load the public key `issuer` signs certificates with
    pub async fn load_key(&self, issuer: &str, principal_domain: &str) -> Result<PublicKey> {
        for (index, source) in self.sources.iter().enumerate() {
            match source.load(issuer).await {
                KeyLookup::Found(key) => {
                    tracing::debug!(issuer, source = index, "issuer key loaded locally");
                    return Ok(key);
                }
                KeyLookup::Declined => continue,
                KeyLookup::Failed(e) => {
                    tracing::warn!(issuer, source = index, error = %e, "key source failed");
                    return Err(e);
                }
            }
        }

        let delegation = self.resolver.resolve(issuer, principal_domain).await?;
        delegation
            .public_key()
            .cloned()
            .ok_or_else(|| Error::MissingKey {
                domain: delegation.domain.clone(),
            })
    }
}
