//! Identity assertions
//!
//! A backed assertion is `<cert-1>~...~<cert-n>~<assertion>`: the certificate
//! chain followed by an assertion signed with the last certificate's key.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::jws::{self, Segments};
use crate::{Certificate, Error, KeyPair, PublicKey, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Expiration time (Unix seconds)
    pub exp: i64,

    /// Relying party origin
    pub aud: String,
}

#[derive(Debug, Clone)]
pub struct Assertion {
    encoded: String,
    claims: AssertionClaims,
    expires: DateTime<Utc>,
}

impl Assertion {
    /// Sign an assertion for `audience`, valid for `validity` from now
    pub fn create(audience: &str, validity: Duration, user_key: &KeyPair) -> Result<Self> {
        Self::create_at(audience, Utc::now(), validity, user_key)
    }

    /// Sign an assertion issued at a given instant
    pub fn create_at(
        audience: &str,
        issued_at: DateTime<Utc>,
        validity: Duration,
        user_key: &KeyPair,
    ) -> Result<Self> {
        let claims = AssertionClaims {
            exp: (issued_at + validity).timestamp(),
            aud: audience.to_string(),
        };
        let encoded = jws::sign(&claims, user_key)?;

        Self::from_claims(encoded, claims)
    }

    /// Decode without checking the signature
    pub fn parse(encoded: &str) -> Result<Self> {
        let claims = Segments::split(encoded, Error::InvalidAssertion)?.claims()?;
        Self::from_claims(encoded.to_string(), claims)
    }

    fn from_claims(encoded: String, claims: AssertionClaims) -> Result<Self> {
        let expires = jws::timestamp(claims.exp, Error::InvalidAssertion)?;
        Ok(Self {
            encoded,
            claims,
            expires,
        })
    }

    pub fn verify(&self, user_key: &PublicKey) -> Result<()> {
        Segments::split(&self.encoded, Error::InvalidAssertion)?.verify(user_key)
    }

    /// Expired when `exp` is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires
    }

    pub fn claims(&self) -> &AssertionClaims {
        &self.claims
    }

    pub fn audience(&self) -> &str {
        &self.claims.aud
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

#[derive(Debug, Clone)]
pub struct BackedAssertion {
    certificates: Vec<Certificate>,
    assertion: Assertion,
}

impl BackedAssertion {
    pub fn new(certificate: Certificate, assertion: Assertion) -> Self {
        Self::with_chain(vec![certificate], assertion)
    }

    pub fn with_chain(certificates: Vec<Certificate>, assertion: Assertion) -> Self {
        Self {
            certificates,
            assertion,
        }
    }

    /// Parse the `cert~...~assertion` form. Signatures are not checked.
    pub fn parse(encoded: &str) -> Result<Self> {
        let Some((chain, assertion)) = encoded.rsplit_once('~') else {
            return Err(Error::InvalidAssertion(
                "backed assertion must have at least one certificate and one assertion".into(),
            ));
        };

        let certificates = chain
            .split('~')
            .map(Certificate::parse)
            .collect::<Result<Vec<_>>>()?;
        let assertion = Assertion::parse(assertion)?;

        Ok(Self {
            certificates,
            assertion,
        })
    }

    pub fn encode(&self) -> String {
        let mut parts: Vec<&str> = self.certificates.iter().map(|c| c.encoded()).collect();
        parts.push(self.assertion.encoded());
        parts.join("~")
    }

    /// Check signatures and validity of a single-certificate bundle.
    ///
    /// The certificate must be signed by `issuer_key` and the assertion by the
    /// certified user key. Either one expiring at or before `now` is
    /// [`Error::Expired`]. Audience is left to the caller.
    pub fn verify_at(&self, issuer_key: &PublicKey, now: DateTime<Utc>) -> Result<()> {
        let cert = match self.certificates.as_slice() {
            [cert] => cert,
            [] => {
                return Err(Error::InvalidAssertion(
                    "no certificates in chain".into(),
                ))
            }
            chain => return Err(Error::ChainingUnsupported { length: chain.len() }),
        };

        cert.verify(issuer_key)?;
        self.assertion.verify(cert.public_key())?;

        if cert.is_expired_at(now) || self.assertion.is_expired_at(now) {
            return Err(Error::Expired);
        }

        Ok(())
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }
}
