//! BrowserID authentication strategy
//!
//! Authenticates requests carrying a BrowserID assertion: the assertion is
//! verified against its issuer's support document, and the verified email is
//! handed to an application callback that decides which user it maps to.

pub mod callback;
pub mod config;
pub mod error;
pub mod outcome;
pub mod request;
pub mod strategy;
pub mod transport;

pub use callback::{CallbackResult, CallbackShape, VerifyCallback};
pub use config::StrategyOptions;
pub use error::{AuthError, BoxError, ConfigError};
pub use outcome::{Info, Outcome, Verdict};
pub use request::AuthRequest;
pub use strategy::{Clock, FixedClock, Strategy, StrategyBuilder, SystemClock, STRATEGY_NAME};
pub use transport::HttpTransport;
