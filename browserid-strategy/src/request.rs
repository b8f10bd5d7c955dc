//! Inbound authentication request

use std::collections::HashMap;
use std::convert::Infallible;

use axum::async_trait;
use axum::extract::{Form, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Uri};

/// The parts of an HTTP request the strategy reads: the parsed form body,
/// plus enough of the request to hand to a verify callback.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<HashMap<String, String>>,
}

impl AuthRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            ..Default::default()
        }
    }

    /// Attach a parsed form body
    pub fn with_form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// A non-empty form field. `None` when there is no body at all.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.body
            .as_ref()?
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Extracts the request with its `application/x-www-form-urlencoded` body.
/// A missing or unparseable body is recorded as absent rather than rejected,
/// so the strategy can answer it. The query string is never read: `GET` and
/// `HEAD` requests have no body.
#[async_trait]
impl<S> FromRequest<S> for AuthRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        let headers = req.headers().clone();

        let body = if carries_form_body(&method, &headers) {
            match Form::<HashMap<String, String>>::from_request(req, state).await {
                Ok(Form(fields)) => Some(fields),
                Err(rejection) => {
                    tracing::debug!(%rejection, "unreadable form body on authentication request");
                    None
                }
            }
        } else {
            tracing::debug!(%method, "no form body on authentication request");
            None
        };

        Ok(Self {
            method,
            uri,
            headers,
            body,
        })
    }
}

fn carries_form_body(method: &Method, headers: &HeaderMap) -> bool {
    if *method == Method::GET || *method == Method::HEAD {
        return false;
    }

    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}
