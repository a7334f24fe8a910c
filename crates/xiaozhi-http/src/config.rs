use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    ApiError, DEFAULT_BASE_PATH, DEFAULT_ORIGIN, DEFAULT_TIMEOUT_MS, FALLBACK_MESSAGE,
    extract::ErrorExtractor,
};

/// Settings for an [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Scheme, host and port the backend is reachable at.
    pub origin: String,
    /// Prefix put in front of every request path.
    pub base_path: String,
    /// Per-request deadline in milliseconds, covering connect, send and body read.
    pub timeout_ms: u64,
    /// Shown when an error response carries no usable message.
    pub fallback_message: String,
    /// JSON pointers searched for the error message, in order.
    pub error_pointers: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fallback_message: FALLBACK_MESSAGE.to_string(),
            error_pointers: vec!["/error".to_string()],
        }
    }
}

impl HttpConfig {
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn extractor(&self) -> ErrorExtractor {
        ErrorExtractor::new(&self.error_pointers, self.fallback_message.clone())
    }

    /// Origin joined with the base path, always ending in `/` so relative
    /// request paths resolve underneath it.
    pub fn base_url(&self) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.origin)
            .map_err(|e| ApiError::Build(format!("invalid origin {:?}: {e}", self.origin)))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::Build(format!(
                "origin {:?} cannot be used as a base URL",
                self.origin
            )));
        }
        let mut path = url.path().trim_end_matches('/').to_string();
        path.push('/');
        path.push_str(self.base_path.trim_matches('/'));
        if !path.ends_with('/') {
            path.push('/');
        }
        url.set_path(&path);
        Ok(url)
    }
}
