use serde_json::Value;
use thiserror::Error;

/// Every way an API call can fail. All variants go through the same error
/// hooks before reaching the caller.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The client or the request could not be constructed (bad URL, body
    /// serialization, multipart part).
    #[error("Failed to build request: {0}")]
    Build(String),

    /// A file chosen for upload could not be read.
    #[error("Failed to read upload {name}: {message}")]
    Upload { name: String, message: String },

    /// Network failure or timeout; no response was received.
    #[error("Network request failed: {message}")]
    Request {
        message: String,
        /// Optional URL for additional context.
        url: Option<String>,
        is_timeout: bool,
    },

    /// The server answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        url: Option<String>,
        /// Parsed body when it was JSON.
        body: Option<Value>,
        /// Truncated raw body for diagnostics.
        body_snippet: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to deserialize response data: {message}")]
    Deserialization {
        message: String,
        body_snippet: Option<String>,
    },

    /// An interceptor refused the request or response.
    #[error("Rejected by interceptor: {0}")]
    Rejected(String),
}

impl ApiError {
    pub(crate) fn from_transport(err: reqwest::Error, url: &url::Url) -> Self {
        ApiError::Request {
            message: err.to_string(),
            url: Some(url.to_string()),
            is_timeout: err.is_timeout(),
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, url: &url::Url, raw: &[u8]) -> Self {
        let body = serde_json::from_slice::<Value>(raw).ok();
        let text = String::from_utf8_lossy(raw);
        let body_snippet = (!text.trim().is_empty()).then(|| truncate_for_error(&text, 2_000));
        ApiError::Api {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
            url: Some(url.to_string()),
            body,
            body_snippet,
        }
    }

    pub(crate) fn deserialization(err: serde_json::Error, raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        ApiError::Deserialization {
            message: err.to_string(),
            body_snippet: Some(truncate_for_error(&text, 2_000)),
        }
    }

    /// JSON body of an error response, when there is one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// HTTP status of an error response, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Request { is_timeout: true, .. })
    }

    /// Returns a diagnostic string with contextual fields for log surfaces.
    pub fn diagnostic(&self) -> String {
        match self {
            ApiError::Request {
                message,
                url,
                is_timeout,
            } => {
                let mut msg = format!("Network request failed: {message}");
                if let Some(u) = url {
                    msg.push_str(&format!("\nurl: {u}"));
                }
                if *is_timeout {
                    msg.push_str("\ncontext: timed out");
                }
                msg
            }
            ApiError::Api {
                status,
                message,
                url,
                body_snippet,
                ..
            } => {
                let mut msg = format!("API error (status {status}): {message}");
                if let Some(u) = url {
                    msg.push_str(&format!("\nurl: {u}"));
                }
                if let Some(snippet) = body_snippet {
                    msg.push_str("\nbody excerpt: ");
                    msg.push_str(snippet);
                }
                msg
            }
            ApiError::Deserialization {
                message,
                body_snippet,
            } => {
                let mut msg = format!("Failed to deserialize response data: {message}");
                if let Some(snippet) = body_snippet {
                    msg.push_str("\nbody excerpt: ");
                    msg.push_str(snippet);
                }
                msg
            }
            other => other.to_string(),
        }
    }
}

impl From<ApiError> for xiaozhi_error::Error {
    fn from(error: ApiError) -> Self {
        use xiaozhi_error::{DomainError, InternalError};
        match error {
            ApiError::Build(message) => InternalError::InvalidState(message).into(),
            ApiError::Upload { name, message } => DomainError::Io {
                message: format!("{name}: {message}"),
            }
            .into(),
            ApiError::Request { message, .. } => DomainError::Http {
                status: None,
                message,
            }
            .into(),
            ApiError::Api {
                status, message, ..
            } => DomainError::Http {
                status: Some(status),
                message,
            }
            .into(),
            ApiError::Deserialization { message, .. } => {
                InternalError::Serialization(message).into()
            }
            ApiError::Rejected(message) => xiaozhi_error::Error::Warning(message),
        }
    }
}

/// Truncate large response bodies so error strings remain bounded.
pub(crate) fn truncate_for_error(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // Keep a little tail too; it often holds the interesting part.
    let head_end = floor_char_boundary(s, max.saturating_sub(200));
    let tail_start = ceil_char_boundary(s, s.len().saturating_sub(200));
    format!("{}…<snip>…{}", &s[..head_end], &s[tail_start..])
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
