//! Support document discovery
//!
//! A domain publishes its BrowserID support document at
//! `https://<domain>/.well-known/browserid`. The document either carries the
//! domain's public key or names another domain as its authority.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Error, PublicKey, Result};

pub const WELL_KNOWN_PATH: &str = "/.well-known/browserid";

/// Default per-fetch timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a support document places trust
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAuthority {
    /// The domain signs certificates itself with this key
    Key(PublicKey),
    /// Trust is delegated to another domain's document
    Delegated(String),
}

/// A parsed `/.well-known/browserid` document
#[derive(Debug, Clone)]
pub struct SupportDocument {
    pub authority: DocumentAuthority,

    /// Path to the authentication page
    pub authentication: Option<String>,

    /// Path to the provisioning page
    pub provisioning: Option<String>,
}

impl SupportDocument {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            authority: DocumentAuthority::Key(public_key),
            authentication: None,
            provisioning: None,
        }
    }

    pub fn delegate(authority: impl Into<String>) -> Self {
        Self {
            authority: DocumentAuthority::Delegated(authority.into()),
            authentication: None,
            provisioning: None,
        }
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        match &self.authority {
            DocumentAuthority::Key(key) => Some(key),
            DocumentAuthority::Delegated(_) => None,
        }
    }

    pub fn delegated_to(&self) -> Option<&str> {
        match &self.authority {
            DocumentAuthority::Key(_) => None,
            DocumentAuthority::Delegated(domain) => Some(domain),
        }
    }

    /// Parse the body served by `domain`.
    ///
    /// `authority`, when present, wins over `public-key` and must be a
    /// non-empty string. Without it a valid `public-key` is mandatory.
    pub fn from_json(domain: &str, body: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedDocument {
            domain: domain.to_string(),
            reason,
        };

        let value: Value =
            serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;
        let Value::Object(doc) = value else {
            return Err(malformed("support document must contain a JSON object".into()));
        };

        let authentication = string_field(&doc, "authentication").map_err(&malformed)?;
        let provisioning = string_field(&doc, "provisioning").map_err(&malformed)?;

        if doc.get("disabled").and_then(Value::as_bool) == Some(true) {
            tracing::debug!(domain, "support document is disabled");
            return Err(Error::MissingKey {
                domain: domain.to_string(),
            });
        }

        let authority = match string_field(&doc, "authority").map_err(&malformed)? {
            Some(delegate) if delegate.is_empty() => {
                return Err(malformed("malformed authority".into()))
            }
            Some(delegate) => DocumentAuthority::Delegated(delegate),
            None => {
                let key = doc.get("public-key").ok_or_else(|| Error::MissingKey {
                    domain: domain.to_string(),
                })?;
                let key = serde_json::from_value(key.clone())
                    .map_err(|e| malformed(format!("malformed public key: {}", e)))?;
                DocumentAuthority::Key(key)
            }
        };

        Ok(Self {
            authority,
            authentication,
            provisioning,
        })
    }
}

fn string_field(doc: &Map<String, Value>, name: &str) -> std::result::Result<Option<String>, String> {
    match doc.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("malformed {}: expected a string", name)),
    }
}

/// Path requested from a domain, tagged with the principal domain being checked
pub fn well_known_path(principal_domain: &str) -> String {
    format!("{}?domain={}", WELL_KNOWN_PATH, principal_domain)
}

/// Raw response to a support document request
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// One HTTPS GET against `host` (which may carry a `:port`).
///
/// Production code uses a real HTTP client; tests plug in canned responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, host: &str, path: &str) -> std::result::Result<TransportResponse, String>;
}

/// Fetches a single support document, without following delegation
#[async_trait]
pub trait SupportDocumentFetcher: Send + Sync {
    async fn fetch(&self, domain: &str, principal_domain: &str) -> Result<SupportDocument>;
}

#[async_trait]
impl<T: SupportDocumentFetcher + ?Sized> SupportDocumentFetcher for Arc<T> {
    async fn fetch(&self, domain: &str, principal_domain: &str) -> Result<SupportDocument> {
        (**self).fetch(domain, principal_domain).await
    }
}

/// Fetcher speaking the well-known protocol over a [`Transport`]
#[derive(Clone)]
pub struct WellKnownFetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl WellKnownFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SupportDocumentFetcher for WellKnownFetcher {
    async fn fetch(&self, domain: &str, principal_domain: &str) -> Result<SupportDocument> {
        let path = well_known_path(principal_domain);
        let network = |reason: String| Error::Network {
            domain: domain.to_string(),
            reason,
        };

        tracing::debug!(domain, %path, "fetching support document");
        let response = tokio::time::timeout(self.timeout, self.transport.get(domain, &path))
            .await
            .map_err(|_| network(format!("timed out after {:?}", self.timeout)))?
            .map_err(&network)?;

        if response.status != 200 {
            return Err(network(format!(
                "not a BrowserID IdP: status {} for support document",
                response.status
            )));
        }

        let content_type = response.content_type.as_deref().unwrap_or_default();
        if !content_type.starts_with("application/json") {
            return Err(Error::MalformedDocument {
                domain: domain.to_string(),
                reason: format!(
                    "not a BrowserID IdP: content type {:?} for support document",
                    content_type
                ),
            });
        }

        SupportDocument::from_json(domain, &response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedTransport {
        response: TransportResponse,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl CannedTransport {
        fn new(status: u16, content_type: &str, body: String) -> Arc<Self> {
            Arc::new(Self {
                response: TransportResponse {
                    status,
                    content_type: Some(content_type.to_string()),
                    body,
                },
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get(&self, host: &str, path: &str) -> std::result::Result<TransportResponse, String> {
            self.requests
                .lock()
                .unwrap()
                .push((host.to_string(), path.to_string()));
            Ok(self.response.clone())
        }
    }

    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn get(&self, _: &str, _: &str) -> std::result::Result<TransportResponse, String> {
            std::future::pending().await
        }
    }

    fn key_body(key: &PublicKey) -> String {
        json!({ "public-key": key, "authentication": "/auth", "provisioning": "/provision" })
            .to_string()
    }

    #[test]
    fn test_parse_key_document() {
        let key = KeyPair::generate().public_key();
        let doc = SupportDocument::from_json("mockmyid.com", &key_body(&key)).unwrap();

        assert_eq!(doc.public_key(), Some(&key));
        assert_eq!(doc.authentication.as_deref(), Some("/auth"));
        assert_eq!(doc.provisioning.as_deref(), Some("/provision"));
    }

    #[test]
    fn test_authority_wins_over_key() {
        let key = KeyPair::generate().public_key();
        let body = json!({ "authority": "login.persona.org", "public-key": key }).to_string();
        let doc = SupportDocument::from_json("gmail.com", &body).unwrap();

        assert_eq!(doc.delegated_to(), Some("login.persona.org"));
        assert!(doc.public_key().is_none());
    }

    #[test]
    fn test_object_authority_is_malformed() {
        let body = json!({ "authority": { "host": "login.persona.org" } }).to_string();
        assert!(matches!(
            SupportDocument::from_json("gmail.com", &body),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_missing_key() {
        let body = json!({ "authentication": "/auth" }).to_string();
        assert!(matches!(
            SupportDocument::from_json("example.com", &body),
            Err(Error::MissingKey { .. })
        ));
    }

    #[test]
    fn test_disabled_document_has_no_key() {
        let key = KeyPair::generate().public_key();
        let body = json!({ "disabled": true, "public-key": key }).to_string();
        assert!(matches!(
            SupportDocument::from_json("example.com", &body),
            Err(Error::MissingKey { .. })
        ));
    }

    #[test]
    fn test_non_object_and_bad_json() {
        for body in ["[]", "\"hello\"", "{not json"] {
            assert!(matches!(
                SupportDocument::from_json("example.com", body),
                Err(Error::MalformedDocument { .. })
            ));
        }
    }

    #[test]
    fn test_unusable_key_is_malformed() {
        let body = json!({ "public-key": { "algorithm": "RS", "n": "1", "e": "3" } }).to_string();
        assert!(matches!(
            SupportDocument::from_json("example.com", &body),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_requests_well_known_path() {
        let key = KeyPair::generate().public_key();
        let transport = CannedTransport::new(200, "application/json; charset=utf-8", key_body(&key));
        let fetcher = WellKnownFetcher::new(transport.clone());

        let doc = fetcher.fetch("mockmyid.com", "mockmyid.com").await.unwrap();
        assert_eq!(doc.public_key(), Some(&key));

        let requests = transport.requests.lock().unwrap();
        assert_eq!(
            *requests,
            vec![(
                "mockmyid.com".to_string(),
                "/.well-known/browserid?domain=mockmyid.com".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_non_200_is_network_error() {
        let transport = CannedTransport::new(404, "application/json", "{}".into());
        let fetcher = WellKnownFetcher::new(transport);

        assert!(matches!(
            fetcher.fetch("example.com", "example.com").await,
            Err(Error::Network { .. })
        ));
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_malformed() {
        let key = KeyPair::generate().public_key();
        let transport = CannedTransport::new(200, "text/html", key_body(&key));
        let fetcher = WellKnownFetcher::new(transport);

        assert!(matches!(
            fetcher.fetch("example.com", "example.com").await,
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let fetcher = WellKnownFetcher::new(Arc::new(StalledTransport))
            .with_timeout(Duration::from_millis(20));

        assert!(matches!(
            fetcher.fetch("slow.example.com", "slow.example.com").await,
            Err(Error::Network { .. })
        ));
    }
}
