//! The BrowserID authentication strategy
//!
//! Authenticates a request by verifying the BrowserID assertion posted in its
//! form body, then asking the application which user the verified email
//! belongs to.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use browserid_verify::{
    AssertionVerifier, DelegationResolver, KeyChain, KeySource, SupportDocumentFetcher, Transport,
    VerifyRequest, WellKnownFetcher,
};
use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::callback::VerifyCallback;
use crate::config::StrategyOptions;
use crate::error::{AuthError, ConfigError};
use crate::outcome::{Outcome, Verdict};
use crate::request::AuthRequest;
use crate::transport::HttpTransport;

pub const STRATEGY_NAME: &str = "browserid";

const MISSING_ASSERTION: &str = "Missing assertion";

/// Source of the verification instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

type Fetcher = Arc<dyn SupportDocumentFetcher>;

pub struct Strategy<U> {
    options: StrategyOptions,
    verifier: AssertionVerifier<Fetcher>,
    callback: VerifyCallback<U>,
    clock: Arc<dyn Clock>,
}

impl<U: Send + 'static> Strategy<U> {
    /// Strategy fetching support documents over HTTPS
    pub fn new(options: StrategyOptions, callback: VerifyCallback<U>) -> Result<Self, ConfigError> {
        StrategyBuilder::new(options).build(callback)
    }

    pub fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    pub fn options(&self) -> &StrategyOptions {
        &self.options
    }

    /// Run one authentication attempt to a terminal outcome
    pub async fn authenticate(&self, req: &AuthRequest) -> Outcome<U> {
        let Some(assertion) = req.form_field(&self.options.assertion_field) else {
            tracing::debug!(field = %self.options.assertion_field, "no assertion in request");
            return Outcome::fail_with_status(MISSING_ASSERTION, StatusCode::BAD_REQUEST);
        };

        let request = VerifyRequest {
            assertion: assertion.to_string(),
            audience: self.options.audience.clone(),
        };
        let verified = match self.verifier.verify(&request, self.clock.now()).await {
            Ok(verified) => verified,
            Err(e) if e.is_assertion_rejection() => {
                tracing::warn!(error = %e, "assertion rejected");
                return Outcome::fail_with_status(e.to_string(), StatusCode::FORBIDDEN);
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind(), "assertion verification failed");
                return Outcome::Error(AuthError::Verification(e));
            }
        };

        tracing::debug!(email = %verified.email, issuer = %verified.issuer, "assertion verified");

        // The callback runs inside the guarded future so a panic while
        // building its future is caught too.
        let decision = AssertUnwindSafe(async { self.callback.call(req, &verified).await })
            .catch_unwind()
            .await;

        match decision {
            Ok(Ok(Verdict {
                user: Some(user),
                info,
            })) => Outcome::Success { user, info },
            Ok(Ok(Verdict { user: None, info })) => {
                tracing::debug!(email = %verified.email, "application declined user");
                Outcome::Fail { info, status: None }
            }
            Ok(Err(e)) => Outcome::Error(AuthError::Callback(e)),
            Err(panic) => Outcome::Error(AuthError::CallbackPanicked(panic_message(panic))),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Collects the pluggable parts of a [`Strategy`] before it is built
pub struct StrategyBuilder {
    options: StrategyOptions,
    transport: Option<Arc<dyn Transport>>,
    key_sources: Vec<Arc<dyn KeySource>>,
    clock: Arc<dyn Clock>,
}

impl StrategyBuilder {
    pub fn new(options: StrategyOptions) -> Self {
        Self {
            options,
            transport: None,
            key_sources: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the HTTPS transport used to fetch support documents
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Add a local key source, consulted before discovery in the order added
    pub fn key_source(mut self, source: Arc<dyn KeySource>) -> Self {
        self.key_sources.push(source);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build<U: Send + 'static>(self, callback: VerifyCallback<U>) -> Result<Strategy<U>, ConfigError> {
        let options = self.options;
        options.validate()?;

        let shape = callback.shape();
        if shape.takes_request() != options.pass_req_to_callback {
            return Err(ConfigError::CallbackShape {
                shape,
                pass_req_to_callback: options.pass_req_to_callback,
            });
        }

        let timeout = Duration::from_secs(options.fetch_timeout_secs);
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(timeout)?),
        };
        let fetcher: Fetcher = Arc::new(WellKnownFetcher::new(transport).with_timeout(timeout));

        let mut keychain = KeyChain::new(
            DelegationResolver::new(fetcher).with_max_depth(options.max_delegation_depth),
        );
        for source in self.key_sources {
            keychain.register(source);
        }
        let verifier =
            AssertionVerifier::new(keychain).with_trusted_issuers(options.trusted_issuers.iter().cloned());

        tracing::debug!(
            audience = %options.audience,
            trusted_issuers = ?options.trusted_issuers,
            ?shape,
            "browserid strategy configured"
        );

        Ok(Strategy {
            options,
            verifier,
            callback,
            clock: self.clock,
        })
    }
}
