//! Backed assertion verification
//!
//! Verification loads the issuer's key, checks the bundle's signatures and
//! expiry, confirms the issuer may vouch for the email's domain, then checks
//! the audience.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::certificate::principal_domain;
use crate::discovery::SupportDocumentFetcher;
use crate::keychain::KeyChain;
use crate::{BackedAssertion, Error, Result};

/// An assertion to check and the audience it must be bound to
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    /// Backed assertion in `cert~assertion` form
    pub assertion: String,

    /// Expected relying party origin
    pub audience: String,
}

/// A successfully verified identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub email: String,
    pub issuer: String,
    pub audience: String,
    pub expires: DateTime<Utc>,
}

pub struct AssertionVerifier<F> {
    keychain: KeyChain<F>,
    trusted_issuers: HashSet<String>,
}

impl<F: SupportDocumentFetcher> AssertionVerifier<F> {
    pub fn new(keychain: KeyChain<F>) -> Self {
        Self {
            keychain,
            trusted_issuers: HashSet::new(),
        }
    }

    /// Issuers accepted for any email domain without a confirmation lookup
    pub fn with_trusted_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_issuers = issuers
            .into_iter()
            .map(|issuer| issuer.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn is_trusted(&self, issuer: &str) -> bool {
        self.trusted_issuers.contains(&issuer.to_ascii_lowercase())
    }

    pub async fn verify(&self, request: &VerifyRequest, now: DateTime<Utc>) -> Result<VerificationResult> {
        let backed = BackedAssertion::parse(&request.assertion)?;
        let cert = match backed.certificates() {
            [cert] => cert,
            [] => return Err(Error::InvalidAssertion("no certificates in chain".into())),
            chain => return Err(Error::ChainingUnsupported { length: chain.len() }),
        };

        // Domain names compare case-insensitively.
        let email = cert.email();
        let issuer = cert.issuer().to_ascii_lowercase();
        let principal = principal_domain(email)
            .ok_or_else(|| {
                Error::InvalidCertificate(format!("cannot extract domain from {:?}", email))
            })?
            .to_ascii_lowercase();
        let (issuer, principal) = (issuer.as_str(), principal.as_str());

        let issuer_key = self.keychain.load_key(issuer, principal).await?;
        backed.verify_at(&issuer_key, now)?;

        // Self-issued domains still go through confirmation; only trusted
        // issuers skip it.
        if self.is_trusted(issuer) {
            tracing::debug!(issuer, principal, "issuer is trusted");
        } else {
            let delegation = self.keychain.resolver().resolve(principal, principal).await?;
            if !delegation.domain.eq_ignore_ascii_case(issuer) {
                tracing::warn!(issuer, principal, authority = %delegation.domain, "issuer not authorized");
                return Err(Error::IssuerNotAuthorized {
                    issuer: issuer.to_string(),
                    domain: principal.to_string(),
                });
            }
        }

        let audience = backed.assertion().audience();
        if audience != request.audience {
            return Err(Error::AudienceMismatch {
                expected: request.audience.clone(),
                actual: audience.to_string(),
                reason: audience_mismatch_reason(&request.audience, audience),
            });
        }

        let expires = backed.assertion().expires_at();
        tracing::debug!(email, issuer, "assertion verified");
        Ok(VerificationResult {
            email: email.to_string(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            expires,
        })
    }
}

/// Scheme, host and port of an origin, with default ports filled in
#[derive(Debug, PartialEq)]
struct Origin<'a> {
    scheme: &'a str,
    host: &'a str,
    port: Option<u16>,
}

impl<'a> Origin<'a> {
    fn parse(origin: &'a str) -> Option<Self> {
        let (scheme, rest) = origin.split_once("://")?;
        let authority = rest.split('/').next()?;
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port.parse().ok()?)),
            None => (authority, None),
        };
        let port = port.or(match scheme {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        });

        Some(Self { scheme, host, port })
    }
}

/// `None` when either side is not a comparable origin, or the origins agree
/// and only the rest of the string differs
fn audience_mismatch_reason(expected: &str, actual: &str) -> Option<&'static str> {
    let (expected, actual) = (Origin::parse(expected)?, Origin::parse(actual)?);

    if expected.scheme != actual.scheme {
        Some("scheme mismatch")
    } else if expected.host != actual.host {
        Some("domain mismatch")
    } else if expected.port != actual.port {
        Some("port mismatch")
    } else {
        None
    }
}
