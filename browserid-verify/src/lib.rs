//! BrowserID assertion verification
//!
//! Verifies backed identity assertions on behalf of a relying party:
//! - Issuers publish keys in `/.well-known/browserid` support documents
//! - Domains may delegate authority to another domain's document
//! - Verifiers check the certificate against the issuer key, confirm the
//!   issuer may vouch for the email's domain, and check audience and expiry

pub mod assertion;
pub mod certificate;
pub mod discovery;
pub mod error;
mod jws;
pub mod keychain;
pub mod keys;
pub mod resolver;
pub mod verifier;

pub use assertion::{Assertion, BackedAssertion};
pub use certificate::{principal_domain, Certificate};
pub use discovery::{
    DocumentAuthority, SupportDocument, SupportDocumentFetcher, Transport, TransportResponse,
    WellKnownFetcher,
};
pub use error::{Error, ErrorKind};
pub use keychain::{KeyChain, KeyLookup, KeySource, StaticKeySource};
pub use keys::{KeyPair, PublicKey};
pub use resolver::{Delegation, DelegationResolver, DEFAULT_MAX_DELEGATION_DEPTH};
pub use verifier::{AssertionVerifier, VerificationResult, VerifyRequest};

/// Result type for browserid-verify operations
pub type Result<T> = std::result::Result<T, Error>;
