//! Compact JWS encoding shared by certificates and assertions
//!
//! `base64url(header).base64url(claims).base64url(signature)`, EdDSA only.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::{KeyPair, PublicKey, Result};

const HEADER: &str = r#"{"alg":"EdDSA","typ":"JWT"}"#;

/// The three dot-separated segments of a compact JWS
pub(crate) struct Segments<'a> {
    signing_input: &'a str,
    claims: &'a str,
    signature: &'a str,
}

impl<'a> Segments<'a> {
    /// Split `encoded`, reporting malformed input through `invalid`
    pub(crate) fn split(encoded: &'a str, invalid: fn(String) -> crate::Error) -> Result<Self> {
        let mut parts = encoded.splitn(3, '.');
        let (Some(header), Some(claims), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected 3 JWT parts".into()));
        };
        if signature.contains('.') {
            return Err(invalid("expected 3 JWT parts".into()));
        }

        Ok(Self {
            signing_input: &encoded[..header.len() + 1 + claims.len()],
            claims,
            signature,
        })
    }

    pub(crate) fn claims<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = URL_SAFE_NO_PAD.decode(self.claims)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) fn verify(&self, key: &PublicKey) -> Result<()> {
        let signature = URL_SAFE_NO_PAD.decode(self.signature)?;
        key.verify(self.signing_input.as_bytes(), &signature)
    }
}

/// A Unix-seconds claim as an instant; values chrono cannot represent go
/// through `invalid`
pub(crate) fn timestamp(secs: i64, invalid: fn(String) -> crate::Error) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| invalid(format!("timestamp {} is out of range", secs)))
}

/// Serialize `claims` and sign them with `key`
pub(crate) fn sign<T: Serialize>(claims: &T, key: &KeyPair) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(HEADER);
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{}.{}", header, claims);
    let signature = URL_SAFE_NO_PAD.encode(key.sign(signing_input.as_bytes()));

    Ok(format!("{}.{}", signing_input, signature))
}
