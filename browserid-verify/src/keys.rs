//! Ed25519 keys as they appear in support documents and certificates
//!
//! On the wire a key is `{"algorithm": "Ed25519", "publicKey": "<base64url>"}`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const ALGORITHM: &str = "Ed25519";

/// Serialized form of a public key
#[derive(Serialize, Deserialize)]
struct Jwk {
    algorithm: String,
    #[serde(rename = "publicKey")]
    public_key: String,
}

/// A domain or user public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Jwk", into = "Jwk")]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKey("public key must be 32 bytes".into()))?;
        VerifyingKey::from_bytes(&bytes)
            .map(|inner| Self { inner })
            .map_err(|e| Error::InvalidKey(e.to_string()))
    }

    /// Encode as base64url (no padding)
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.inner.as_bytes())
    }

    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Verify `signature` over `message`
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Signature::from_slice(signature)
            .map_err(|_| Error::InvalidKey("signature must be 64 bytes".into()))?;
        self.inner
            .verify(message, &signature)
            .map_err(|_| Error::SignatureVerificationFailed)
    }
}

impl TryFrom<Jwk> for PublicKey {
    type Error = Error;

    fn try_from(jwk: Jwk) -> Result<Self> {
        if jwk.algorithm != ALGORITHM {
            return Err(Error::InvalidKey(format!(
                "unsupported algorithm: {}",
                jwk.algorithm
            )));
        }
        Self::from_base64(&jwk.public_key)
    }
}

impl From<PublicKey> for Jwk {
    fn from(key: PublicKey) -> Self {
        Jwk {
            algorithm: ALGORITHM.to_string(),
            public_key: key.to_base64(),
        }
    }
}

/// A signing keypair. Used by issuers and user agents to mint
/// certificates and assertions.
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.signing_key.verifying_key(),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}
