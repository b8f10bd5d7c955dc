//! Delegation chain resolution
//!
//! Follows `authority` redirects from domain to domain until a document
//! carrying a public key is reached.

use crate::discovery::{SupportDocument, SupportDocumentFetcher};
use crate::{Error, PublicKey, Result};

/// Default bound on the delegation chain, counting the starting domain
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 6;

/// Outcome of following a delegation chain
#[derive(Debug, Clone)]
pub struct Delegation {
    /// The key-bearing domain the chain ended at
    pub domain: String,

    /// Its support document
    pub document: SupportDocument,

    /// Every domain visited, starting with the queried one
    pub chain: Vec<String>,
}

impl Delegation {
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.document.public_key()
    }
}

pub struct DelegationResolver<F> {
    fetcher: F,
    max_depth: usize,
}

impl<F: SupportDocumentFetcher> DelegationResolver<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            max_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve `domain` to a key-bearing support document.
    ///
    /// A domain appearing twice is a cycle; a chain that would grow past
    /// `max_depth` domains is rejected. Cycles are reported first.
    pub async fn resolve(&self, domain: &str, principal_domain: &str) -> Result<Delegation> {
        let mut chain = vec![domain.to_ascii_lowercase()];

        loop {
            let current = chain.last().map(String::as_str).unwrap_or(domain);
            let document = self.fetcher.fetch(current, principal_domain).await?;

            let Some(next) = document.delegated_to().map(str::to_ascii_lowercase) else {
                tracing::debug!(domain, authority = current, hops = chain.len(), "resolved support document");
                let current = current.to_string();
                return Ok(Delegation {
                    domain: current,
                    document,
                    chain,
                });
            };

            tracing::debug!(from = current, to = %next, "following delegated authority");

            let cycle = chain.contains(&next);
            chain.push(next);
            if cycle {
                return Err(Error::DelegationCycle { chain });
            }
            if chain.len() > self.max_depth {
                return Err(Error::DelegationDepthExceeded { chain });
            }
        }
    }
}
