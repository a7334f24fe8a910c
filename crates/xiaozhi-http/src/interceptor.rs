//! Hooks composed around the transport call.
//!
//! ```text
//! build -> request hooks -> transport -> response hooks -> unwrap payload -> caller
//!                 (any step fails) -> error hooks -> caller
//! ```
//!
//! Hooks run in insertion order. Any failure, wherever it happens, is passed
//! through every response hook's [`ResponseInterceptor::on_error`] before it
//! reaches the caller.

use std::fmt;
use std::sync::Arc;

use crate::{
    ApiError,
    client::ApiResponse,
    extract::ErrorExtractor,
    notify::{Notice, NotificationSink},
};

pub trait RequestInterceptor: Send + Sync + fmt::Debug {
    fn on_request(&self, request: reqwest::Request) -> Result<reqwest::Request, ApiError>;
}

pub trait ResponseInterceptor: Send + Sync + fmt::Debug {
    /// Inspect or replace a successful response. Returning `Err` turns it into a failure.
    fn on_response(&self, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        Ok(response)
    }

    /// Observe or rewrite a failure. The returned error is what the caller sees.
    fn on_error(&self, error: ApiError) -> ApiError {
        error
    }
}

/// Lets requests through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl RequestInterceptor for PassThrough {
    fn on_request(&self, request: reqwest::Request) -> Result<reqwest::Request, ApiError> {
        Ok(request)
    }
}

/// Surfaces every failure to the user, then hands the error on unchanged.
#[derive(Debug, Clone)]
pub struct NotifyOnError {
    extractor: ErrorExtractor,
    sink: Arc<dyn NotificationSink>,
}

impl NotifyOnError {
    pub fn new(extractor: ErrorExtractor, sink: Arc<dyn NotificationSink>) -> Self {
        Self { extractor, sink }
    }
}

impl ResponseInterceptor for NotifyOnError {
    fn on_error(&self, error: ApiError) -> ApiError {
        let message = self.extractor.message_for(&error);
        tracing::warn!(
            target: "xiaozhi_http::error",
            diagnostic = %error.diagnostic(),
            notice = %message,
            "request failed"
        );
        self.sink.notify(Notice::error(message));
        error
    }
}

#[derive(Debug, Clone, Default)]
pub struct Interceptors {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Interceptors {
    /// Empty chain: no request hooks, no response hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock chain: pass-through requests, notify on every failure.
    pub fn standard(extractor: ErrorExtractor, sink: Arc<dyn NotificationSink>) -> Self {
        Self::new()
            .with_request(PassThrough)
            .with_response(NotifyOnError::new(extractor, sink))
    }

    pub fn with_request(mut self, hook: impl RequestInterceptor + 'static) -> Self {
        self.request.push(Arc::new(hook));
        self
    }

    pub fn with_response(mut self, hook: impl ResponseInterceptor + 'static) -> Self {
        self.response.push(Arc::new(hook));
        self
    }

    pub fn request_hooks(&self) -> usize {
        self.request.len()
    }

    pub fn response_hooks(&self) -> usize {
        self.response.len()
    }

    pub(crate) fn apply_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Request, ApiError> {
        self.request
            .iter()
            .try_fold(request, |req, hook| hook.on_request(req))
    }

    pub(crate) fn apply_response(&self, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        self.response
            .iter()
            .try_fold(response, |resp, hook| hook.on_response(resp))
    }

    pub(crate) fn apply_error(&self, error: ApiError) -> ApiError {
        self.response
            .iter()
            .fold(error, |err, hook| hook.on_error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationBus;

    #[derive(Debug)]
    struct Tag(&'static str);

    impl ResponseInterceptor for Tag {
        fn on_error(&self, error: ApiError) -> ApiError {
            match error {
                ApiError::Rejected(msg) => ApiError::Rejected(format!("{msg}>{}", self.0)),
                other => other,
            }
        }
    }

    #[test]
    fn error_hooks_run_in_insertion_order() {
        let chain = Interceptors::new().with_response(Tag("a")).with_response(Tag("b"));
        let out = chain.apply_error(ApiError::Rejected("start".into()));
        assert_eq!(out.to_string(), "Rejected by interceptor: start>a>b");
    }

    #[test]
    fn standard_chain_notifies_and_preserves_the_error() {
        let bus = NotificationBus::new(4);
        let mut rx = bus.subscribe();
        let chain = Interceptors::standard(ErrorExtractor::default(), Arc::new(bus));
        assert_eq!(chain.request_hooks(), 1);
        assert_eq!(chain.response_hooks(), 1);

        let out = chain.apply_error(ApiError::Rejected("offline".into()));
        assert!(matches!(out, ApiError::Rejected(ref m) if m == "offline"));
        assert_eq!(rx.try_recv().unwrap().message, crate::FALLBACK_MESSAGE);
    }

    #[test]
    fn pass_through_keeps_the_request() {
        let url = url::Url::parse("http://localhost:5000/api/health").unwrap();
        let req = reqwest::Request::new(reqwest::Method::GET, url.clone());
        let out = Interceptors::new()
            .with_request(PassThrough)
            .apply_request(req)
            .unwrap();
        assert_eq!(out.url(), &url);
        assert_eq!(out.method(), &reqwest::Method::GET);
    }
}
