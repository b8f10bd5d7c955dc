//! Strategy error types

use thiserror::Error;

use crate::callback::CallbackShape;

/// Error returned by an application verify callback
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why an authentication attempt ended in the error state
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Verification(#[from] browserid_verify::Error),

    #[error("verify callback failed: {0}")]
    Callback(#[source] BoxError),

    #[error("verify callback panicked: {0}")]
    CallbackPanicked(String),
}

/// Rejected strategy configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BrowserIDStrategy requires an audience option")]
    MissingAudience,

    #[error("invalid {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("verify callback shape {shape:?} does not match passReqToCallback = {pass_req_to_callback}")]
    CallbackShape {
        shape: CallbackShape,
        pass_req_to_callback: bool,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
