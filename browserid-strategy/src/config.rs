//! Strategy configuration

use browserid_verify::DEFAULT_MAX_DELEGATION_DEPTH;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_ASSERTION_FIELD: &str = "assertion";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOptions {
    /// Origin assertions must be bound to (e.g. `https://www.example.com`)
    pub audience: String,

    /// Form field carrying the assertion
    #[serde(default = "default_assertion_field")]
    pub assertion_field: String,

    /// Hand the request to the verify callback
    #[serde(default)]
    pub pass_req_to_callback: bool,

    /// Issuers accepted for any email domain without a confirmation lookup
    #[serde(default)]
    pub trusted_issuers: Vec<String>,

    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_assertion_field() -> String {
    DEFAULT_ASSERTION_FIELD.to_string()
}

fn default_max_delegation_depth() -> usize {
    DEFAULT_MAX_DELEGATION_DEPTH
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl StrategyOptions {
    pub fn new(audience: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            assertion_field: default_assertion_field(),
            pass_req_to_callback: false,
            trusted_issuers: Vec::new(),
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }

    pub fn assertion_field(mut self, field: impl Into<String>) -> Self {
        self.assertion_field = field.into();
        self
    }

    pub fn pass_req_to_callback(mut self, pass: bool) -> Self {
        self.pass_req_to_callback = pass;
        self
    }

    pub fn trusted_issuers<I, S>(mut self, issuers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_issuers = issuers.into_iter().map(Into::into).collect();
        self
    }

    /// Read options from `BROWSERID_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let audience = lookup("BROWSERID_AUDIENCE").ok_or(ConfigError::MissingAudience)?;
        let mut options = Self::new(audience);

        if let Some(field) = lookup("BROWSERID_ASSERTION_FIELD") {
            options.assertion_field = field;
        }
        if let Some(pass) = lookup("BROWSERID_PASS_REQ_TO_CALLBACK") {
            options.pass_req_to_callback = parse_var("BROWSERID_PASS_REQ_TO_CALLBACK", &pass)?;
        }
        if let Some(issuers) = lookup("BROWSERID_TRUSTED_ISSUERS") {
            options.trusted_issuers = issuers
                .split(',')
                .map(str::trim)
                .filter(|issuer| !issuer.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(depth) = lookup("BROWSERID_MAX_DELEGATION_DEPTH") {
            options.max_delegation_depth = parse_var("BROWSERID_MAX_DELEGATION_DEPTH", &depth)?;
        }
        if let Some(secs) = lookup("BROWSERID_FETCH_TIMEOUT_SECS") {
            options.fetch_timeout_secs = parse_var("BROWSERID_FETCH_TIMEOUT_SECS", &secs)?;
        }

        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audience.trim().is_empty() {
            return Err(ConfigError::MissingAudience);
        }
        if self.assertion_field.is_empty() {
            return Err(ConfigError::Invalid {
                name: "assertionField".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.max_delegation_depth == 0 {
            return Err(ConfigError::Invalid {
                name: "maxDelegationDepth".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
