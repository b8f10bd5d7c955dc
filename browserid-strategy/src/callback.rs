//! Application verify callbacks
//!
//! The application maps a verified email to one of its users. It chooses one
//! of four call shapes when the strategy is built; the shape never changes
//! afterwards.

use std::future::Future;
use std::sync::Arc;

use browserid_verify::VerificationResult;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::BoxError;
use crate::outcome::Verdict;
use crate::request::AuthRequest;

pub type CallbackResult<U> = Result<Verdict<U>, BoxError>;

type EmailFn<U> = dyn Fn(String) -> BoxFuture<'static, CallbackResult<U>> + Send + Sync;
type EmailIssuerFn<U> = dyn Fn(String, String) -> BoxFuture<'static, CallbackResult<U>> + Send + Sync;
type ReqEmailFn<U> = dyn Fn(AuthRequest, String) -> BoxFuture<'static, CallbackResult<U>> + Send + Sync;
type ReqEmailIssuerFn<U> =
    dyn Fn(AuthRequest, String, String) -> BoxFuture<'static, CallbackResult<U>> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackShape {
    EmailOnly,
    EmailAndIssuer,
    ReqAndEmail,
    ReqEmailAndIssuer,
}

impl CallbackShape {
    /// The shape implied by the `pass_req_to_callback` flag and whether the
    /// callback wants the issuer
    pub fn select(pass_req_to_callback: bool, wants_issuer: bool) -> Self {
        match (pass_req_to_callback, wants_issuer) {
            (false, false) => CallbackShape::EmailOnly,
            (false, true) => CallbackShape::EmailAndIssuer,
            (true, false) => CallbackShape::ReqAndEmail,
            (true, true) => CallbackShape::ReqEmailAndIssuer,
        }
    }

    pub fn takes_request(self) -> bool {
        matches!(self, CallbackShape::ReqAndEmail | CallbackShape::ReqEmailAndIssuer)
    }

    pub fn takes_issuer(self) -> bool {
        matches!(self, CallbackShape::EmailAndIssuer | CallbackShape::ReqEmailAndIssuer)
    }
}

pub enum VerifyCallback<U> {
    EmailOnly(Arc<EmailFn<U>>),
    EmailAndIssuer(Arc<EmailIssuerFn<U>>),
    ReqAndEmail(Arc<ReqEmailFn<U>>),
    ReqEmailAndIssuer(Arc<ReqEmailIssuerFn<U>>),
}

impl<U: 'static> VerifyCallback<U> {
    /// `(email)`
    pub fn email<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult<U>> + Send + 'static,
    {
        VerifyCallback::EmailOnly(Arc::new(move |email| f(email).boxed()))
    }

    /// `(email, issuer)`
    pub fn email_and_issuer<F, Fut>(f: F) -> Self
    where
        F: Fn(String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult<U>> + Send + 'static,
    {
        VerifyCallback::EmailAndIssuer(Arc::new(move |email, issuer| f(email, issuer).boxed()))
    }

    /// `(req, email)`
    pub fn req_and_email<F, Fut>(f: F) -> Self
    where
        F: Fn(AuthRequest, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult<U>> + Send + 'static,
    {
        VerifyCallback::ReqAndEmail(Arc::new(move |req, email| f(req, email).boxed()))
    }

    /// `(req, email, issuer)`
    pub fn req_email_and_issuer<F, Fut>(f: F) -> Self
    where
        F: Fn(AuthRequest, String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult<U>> + Send + 'static,
    {
        VerifyCallback::ReqEmailAndIssuer(Arc::new(move |req, email, issuer| {
            f(req, email, issuer).boxed()
        }))
    }
}

impl<U> VerifyCallback<U> {
    pub fn shape(&self) -> CallbackShape {
        match self {
            VerifyCallback::EmailOnly(_) => CallbackShape::EmailOnly,
            VerifyCallback::EmailAndIssuer(_) => CallbackShape::EmailAndIssuer,
            VerifyCallback::ReqAndEmail(_) => CallbackShape::ReqAndEmail,
            VerifyCallback::ReqEmailAndIssuer(_) => CallbackShape::ReqEmailAndIssuer,
        }
    }

    pub(crate) fn call(
        &self,
        req: &AuthRequest,
        result: &VerificationResult,
    ) -> BoxFuture<'static, CallbackResult<U>> {
        let email = result.email.clone();
        match self {
            VerifyCallback::EmailOnly(f) => f(email),
            VerifyCallback::EmailAndIssuer(f) => f(email, result.issuer.clone()),
            VerifyCallback::ReqAndEmail(f) => f(req.clone(), email),
            VerifyCallback::ReqEmailAndIssuer(f) => f(req.clone(), email, result.issuer.clone()),
        }
    }
}

impl<U> Clone for VerifyCallback<U> {
    fn clone(&self) -> Self {
        match self {
            VerifyCallback::EmailOnly(f) => VerifyCallback::EmailOnly(f.clone()),
            VerifyCallback::EmailAndIssuer(f) => VerifyCallback::EmailAndIssuer(f.clone()),
            VerifyCallback::ReqAndEmail(f) => VerifyCallback::ReqAndEmail(f.clone()),
            VerifyCallback::ReqEmailAndIssuer(f) => VerifyCallback::ReqEmailAndIssuer(f.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(CallbackShape::select(false, false), CallbackShape::EmailOnly);
        assert_eq!(CallbackShape::select(false, true), CallbackShape::EmailAndIssuer);
        assert_eq!(CallbackShape::select(true, false), CallbackShape::ReqAndEmail);
        assert_eq!(CallbackShape::select(true, true), CallbackShape::ReqEmailAndIssuer);
    }

    #[test]
    fn test_shape_round_trips_through_select() {
        let callbacks: Vec<VerifyCallback<String>> = vec![
            VerifyCallback::email(|email| async move { Ok(Verdict::success(email)) }),
            VerifyCallback::email_and_issuer(|email, _| async move { Ok(Verdict::success(email)) }),
            VerifyCallback::req_and_email(|_, email| async move { Ok(Verdict::success(email)) }),
            VerifyCallback::req_email_and_issuer(|_, email, _| async move {
                Ok(Verdict::success(email))
            }),
        ];

        for callback in callbacks {
            let shape = callback.shape();
            assert_eq!(
                CallbackShape::select(shape.takes_request(), shape.takes_issuer()),
                shape
            );
        }
    }
}
