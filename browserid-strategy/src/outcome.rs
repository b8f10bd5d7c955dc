//! Authentication outcomes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AuthError;

/// Human-readable detail accompanying a success or failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub message: String,
}

impl Info {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What the application's verify callback decided
#[derive(Debug, Clone)]
pub struct Verdict<U> {
    pub user: Option<U>,
    pub info: Option<Info>,
}

impl<U> Verdict<U> {
    pub fn success(user: U) -> Self {
        Self {
            user: Some(user),
            info: None,
        }
    }

    /// No user: authentication fails
    pub fn fail() -> Self {
        Self {
            user: None,
            info: None,
        }
    }

    pub fn with_info(mut self, info: Info) -> Self {
        self.info = Some(info);
        self
    }
}

/// Terminal state of one authentication attempt
#[derive(Debug)]
pub enum Outcome<U> {
    Success {
        user: U,
        info: Option<Info>,
    },
    Fail {
        info: Option<Info>,
        status: Option<StatusCode>,
    },
    Error(AuthError),
}

impl<U> Outcome<U> {
    pub(crate) fn fail_with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Outcome::Fail {
            info: Some(Info::new(message)),
            status: Some(status),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn user(&self) -> Option<&U> {
        match self {
            Outcome::Success { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn info(&self) -> Option<&Info> {
        match self {
            Outcome::Success { info, .. } | Outcome::Fail { info, .. } => info.as_ref(),
            Outcome::Error(_) => None,
        }
    }

    /// Status to answer a failure with
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Success { .. } => StatusCode::OK,
            Outcome::Fail { status, .. } => status.unwrap_or(StatusCode::UNAUTHORIZED),
            Outcome::Error(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<U: Serialize> IntoResponse for Outcome<U> {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Outcome::Success { user, info } => {
                json!({ "success": true, "user": user, "info": info })
            }
            Outcome::Fail { info, .. } => {
                let reason = info.map(|i| i.message);
                json!({ "success": false, "reason": reason })
            }
            Outcome::Error(e) => {
                tracing::error!(error = %e, "authentication error");
                json!({ "success": false, "reason": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}
