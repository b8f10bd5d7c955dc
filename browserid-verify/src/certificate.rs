//! Identity certificates
//!
//! A certificate binds a user's public key to an email address and is signed
//! by the issuing domain's key.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::jws::{self, Segments};
use crate::{Error, KeyPair, PublicKey, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateClaims {
    /// Issuing domain
    pub iss: String,

    /// Expiration time (Unix seconds)
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(rename = "public-key")]
    pub public_key: PublicKey,

    pub principal: Principal,
}

#[derive(Debug, Clone)]
pub struct Certificate {
    encoded: String,
    claims: CertificateClaims,
    expires: DateTime<Utc>,
}

impl Certificate {
    /// Issue a certificate for `email`, valid for `validity` from now
    pub fn create(
        issuer: &str,
        email: &str,
        user_public_key: &PublicKey,
        validity: Duration,
        issuer_key: &KeyPair,
    ) -> Result<Self> {
        let now = Utc::now();
        let claims = CertificateClaims {
            iss: issuer.to_string(),
            exp: (now + validity).timestamp(),
            iat: Some(now.timestamp()),
            public_key: user_public_key.clone(),
            principal: Principal {
                email: email.to_string(),
            },
        };
        let encoded = jws::sign(&claims, issuer_key)?;

        Self::from_claims(encoded, claims)
    }

    /// Decode without checking the signature
    pub fn parse(encoded: &str) -> Result<Self> {
        let claims = Segments::split(encoded, Error::InvalidCertificate)?
            .claims()
            .map_err(|e| Error::InvalidCertificate(e.to_string()))?;
        Self::from_claims(encoded.to_string(), claims)
    }

    fn from_claims(encoded: String, claims: CertificateClaims) -> Result<Self> {
        let expires = jws::timestamp(claims.exp, Error::InvalidCertificate)?;
        Ok(Self {
            encoded,
            claims,
            expires,
        })
    }

    /// Check the issuer's signature over this certificate
    pub fn verify(&self, issuer_key: &PublicKey) -> Result<()> {
        Segments::split(&self.encoded, Error::InvalidCertificate)?.verify(issuer_key)
    }

    /// Expired when `exp` is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires
    }

    pub fn claims(&self) -> &CertificateClaims {
        &self.claims
    }

    /// The certified user key
    pub fn public_key(&self) -> &PublicKey {
        &self.claims.public_key
    }

    pub fn email(&self) -> &str {
        &self.claims.principal.email
    }

    pub fn issuer(&self) -> &str {
        &self.claims.iss
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Domain part of an email address: everything after the last `@`
pub fn principal_domain(email: &str) -> Option<&str> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(validity: Duration) -> (Certificate, KeyPair) {
        let domain_key = KeyPair::generate();
        let user_key = KeyPair::generate();
        let cert = Certificate::create(
            "mockmyid.com",
            "john@mockmyid.com",
            &user_key.public_key(),
            validity,
            &domain_key,
        )
        .unwrap();
        (cert, domain_key)
    }

    #[test]
    fn test_parsed_certificate_verifies_against_issuer_key() {
        let (cert, domain_key) = issue(Duration::hours(1));

        let parsed = Certificate::parse(cert.encoded()).unwrap();
        parsed.verify(&domain_key.public_key()).unwrap();

        assert_eq!(parsed.issuer(), "mockmyid.com");
        assert_eq!(parsed.email(), "john@mockmyid.com");
        assert!(!parsed.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_wrong_issuer_key_rejected() {
        let (cert, _) = issue(Duration::hours(1));
        assert!(cert.verify(&KeyPair::generate().public_key()).is_err());
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let (cert, _) = issue(Duration::hours(1));
        let exp = cert.expires_at();
        assert_eq!(exp.timestamp(), cert.claims().exp);

        assert!(cert.is_expired_at(exp));
        assert!(!cert.is_expired_at(exp - Duration::seconds(1)));
    }

    #[test]
    fn test_unrepresentable_expiry_rejected() {
        let (cert, domain_key) = issue(Duration::hours(1));
        let mut claims = cert.claims().clone();
        claims.exp = i64::MIN;
        let encoded = jws::sign(&claims, &domain_key).unwrap();

        assert!(matches!(
            Certificate::parse(&encoded),
            Err(Error::InvalidCertificate(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid_certificate() {
        assert!(matches!(
            Certificate::parse("not-a-cert"),
            Err(Error::InvalidCertificate(_))
        ));
    }

    #[test]
    fn test_principal_domain() {
        assert_eq!(principal_domain("john@mockmyid.com"), Some("mockmyid.com"));
        assert_eq!(principal_domain("a@b@example.org"), Some("example.org"));
        assert_eq!(principal_domain("invalid"), None);
        assert_eq!(principal_domain("trailing@"), None);
    }
}
