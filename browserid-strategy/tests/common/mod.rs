//! Common test utilities for strategy tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::http::{Method, Uri};
use browserid_strategy::{
    AuthRequest, FixedClock, Strategy, StrategyBuilder, StrategyOptions, VerifyCallback,
};
use browserid_verify::{
    Assertion, BackedAssertion, Certificate, KeyPair, PublicKey, Transport, TransportResponse,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;

pub const AUDIENCE: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            issuer: None,
        }
    }
}

/// Transport serving canned support documents and recording `(host, path)`
#[derive(Default, Clone)]
pub struct MockTransport {
    responses: Arc<RwLock<HashMap<String, TransportResponse>>>,
    pub requests: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, host: &str, status: u16, content_type: &str, body: String) -> Self {
        self.responses.write().unwrap().insert(
            host.to_string(),
            TransportResponse {
                status,
                content_type: Some(content_type.to_string()),
                body,
            },
        );
        self
    }

    pub fn serve_key(self, host: &str, key: &PublicKey) -> Self {
        let body = json!({
            "public-key": key,
            "authentication": "/browserid/sign_in.html",
            "provisioning": "/browserid/provision.html"
        });
        self.serve(host, 200, "application/json", body.to_string())
    }

    pub fn serve_authority(self, host: &str, authority: &str) -> Self {
        let body = json!({ "authority": authority });
        self.serve(host, 200, "application/json", body.to_string())
    }

    pub fn request_count(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, host: &str, path: &str) -> Result<TransportResponse, String> {
        self.requests
            .write()
            .unwrap()
            .push((host.to_string(), path.to_string()));
        self.responses
            .read()
            .unwrap()
            .get(host)
            .cloned()
            .ok_or_else(|| format!("connect ECONNREFUSED {}", host))
    }
}

/// A minted assertion and the instant it stops being valid
pub struct MintedAssertion {
    pub encoded: String,
    pub expires: DateTime<Utc>,
}

pub fn mint(issuer: &str, issuer_key: &KeyPair, email: &str, audience: &str) -> MintedAssertion {
    let user_key = KeyPair::generate();
    let cert = Certificate::create(
        issuer,
        email,
        &user_key.public_key(),
        Duration::hours(1),
        issuer_key,
    )
    .unwrap();
    let assertion = Assertion::create(audience, Duration::minutes(2), &user_key).unwrap();
    let expires = assertion.expires_at();

    MintedAssertion {
        encoded: BackedAssertion::new(cert, assertion).encode(),
        expires,
    }
}

/// POST request carrying `assertion` in the default form field
pub fn login_request(assertion: &str) -> AuthRequest {
    AuthRequest::new(Method::POST, Uri::from_static("/login")).with_form([("assertion", assertion)])
}

/// Strategy over `transport` with the clock pinned at `now`
pub fn strategy(
    options: StrategyOptions,
    transport: &MockTransport,
    now: DateTime<Utc>,
    callback: VerifyCallback<User>,
) -> Strategy<User> {
    StrategyBuilder::new(options)
        .transport(Arc::new(transport.clone()))
        .clock(Arc::new(FixedClock(now)))
        .build(callback)
        .expect("valid strategy")
}

pub fn email_callback() -> VerifyCallback<User> {
    VerifyCallback::email(|email| async move {
        Ok(browserid_strategy::Verdict::success(User::new(email)))
    })
}
