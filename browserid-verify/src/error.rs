//! Error types for BrowserID verification

use thiserror::Error;

/// Classification tag for a verification failure.
///
/// Several [`Error`] variants share a tag; the tag is what callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AudienceMismatch,
    Expired,
    MalformedDocument,
    MissingKey,
    DelegationCycle,
    DelegationDepthExceeded,
    Network,
    Generic,
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("audience mismatch{}", .reason.map(|r| format!(": {}", r)).unwrap_or_default())]
    AudienceMismatch {
        expected: String,
        actual: String,
        /// Which part of the origin differs, when both sides parse as origins
        reason: Option<&'static str>,
    },

    #[error("expired")]
    Expired,

    #[error("malformed support document for {domain}: {reason}")]
    MalformedDocument { domain: String, reason: String },

    #[error("missing public key in support document for {domain}")]
    MissingKey { domain: String },

    #[error("circular reference in delegating authority: {}", .chain.join(" > "))]
    DelegationCycle { chain: Vec<String> },

    #[error("too many hops while delegating authority: {}", .chain.join(" > "))]
    DelegationDepthExceeded { chain: Vec<String> },

    #[error("failed to fetch support document for {domain}: {reason}")]
    Network { domain: String, reason: String },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("certificate chaining is not yet allowed (chain has {length} certificates)")]
    ChainingUnsupported { length: usize },

    #[error("issuer {issuer} not authorized for domain {domain}")]
    IssuerNotAuthorized { issuer: String, domain: String },

    #[error("key source failed for {issuer}: {reason}")]
    KeySource { issuer: String, reason: String },
}

impl Error {
    /// The classification tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AudienceMismatch { .. } => ErrorKind::AudienceMismatch,
            Error::Expired => ErrorKind::Expired,
            Error::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            Error::MissingKey { .. } => ErrorKind::MissingKey,
            Error::DelegationCycle { .. } => ErrorKind::DelegationCycle,
            Error::DelegationDepthExceeded { .. } => ErrorKind::DelegationDepthExceeded,
            Error::Network { .. } => ErrorKind::Network,
            Error::InvalidKey(_)
            | Error::InvalidCertificate(_)
            | Error::InvalidAssertion(_)
            | Error::SignatureVerificationFailed
            | Error::ChainingUnsupported { .. }
            | Error::IssuerNotAuthorized { .. }
            | Error::KeySource { .. } => ErrorKind::Generic,
        }
    }

    /// True when the assertion itself was rejected (wrong audience or stale),
    /// as opposed to an infrastructure or protocol failure.
    pub fn is_assertion_rejection(&self) -> bool {
        matches!(self.kind(), ErrorKind::AudienceMismatch | ErrorKind::Expired)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidAssertion(format!("JSON error: {}", e))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::InvalidAssertion(format!("base64 decode error: {}", e))
    }
}
