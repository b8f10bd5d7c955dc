//! Shared fixtures for browserid-verify integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use browserid_verify::{
    Assertion, BackedAssertion, Certificate, Error, KeyPair, Result, SupportDocument,
    SupportDocumentFetcher,
};
use chrono::Duration;

/// In-memory fetcher recording every `(domain, principal_domain)` request
#[derive(Default)]
pub struct MockFetcher {
    documents: HashMap<String, SupportDocument>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_domain(&mut self, domain: &str, doc: SupportDocument) {
        self.documents.insert(domain.to_string(), doc);
    }

    pub fn with_domain(mut self, domain: &str, doc: SupportDocument) -> Self {
        self.add_domain(domain, doc);
        self
    }

    pub fn requested_domains(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(domain, _)| domain.clone())
            .collect()
    }
}

#[async_trait]
impl SupportDocumentFetcher for MockFetcher {
    async fn fetch(&self, domain: &str, principal_domain: &str) -> Result<SupportDocument> {
        self.requests
            .lock()
            .unwrap()
            .push((domain.to_string(), principal_domain.to_string()));
        self.documents
            .get(domain)
            .cloned()
            .ok_or_else(|| Error::Network {
                domain: domain.to_string(),
                reason: format!(
                    "{} is not a browserid primary - non-200 response code to /.well-known/browserid",
                    domain
                ),
            })
    }
}

/// Mint a `cert~assertion` bundle for `email`, certified by `issuer`
pub fn backed_assertion(
    issuer: &str,
    issuer_key: &KeyPair,
    email: &str,
    audience: &str,
    validity: Duration,
) -> String {
    let user_key = KeyPair::generate();
    let cert = Certificate::create(
        issuer,
        email,
        &user_key.public_key(),
        Duration::hours(1),
        issuer_key,
    )
    .unwrap();
    let assertion = Assertion::create(audience, validity, &user_key).unwrap();

    BackedAssertion::new(cert, assertion).encode()
}
