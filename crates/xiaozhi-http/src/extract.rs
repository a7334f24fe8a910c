use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiError, FALLBACK_MESSAGE};

/// Pulls a user-facing message out of an error response body.
///
/// Pointers are tried in order (RFC 6901 JSON pointers, e.g. `/error` or
/// `/detail/message`). A pointer matches when it resolves to a non-blank
/// string, or to an object whose `message` is a non-blank string. When none
/// match, or there is no JSON body at all, the fallback text is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorExtractor {
    pointers: Vec<String>,
    fallback: String,
}

impl Default for ErrorExtractor {
    fn default() -> Self {
        Self::new(["/error"], FALLBACK_MESSAGE)
    }
}

impl ErrorExtractor {
    /// Pointers without a leading `/` are treated as top-level field names.
    pub fn new<I, S>(pointers: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pointers = pointers
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                if p.starts_with('/') {
                    p.to_string()
                } else {
                    format!("/{p}")
                }
            })
            .collect();
        Self {
            pointers,
            fallback: fallback.into(),
        }
    }

    pub fn pointers(&self) -> &[String] {
        &self.pointers
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn extract_from(&self, body: &Value) -> Option<String> {
        self.pointers
            .iter()
            .filter_map(|p| body.pointer(p))
            .find_map(message_of)
    }

    pub fn extract(&self, err: &ApiError) -> Option<String> {
        err.body().and_then(|body| self.extract_from(body))
    }

    /// The text to show the user for `err`.
    pub fn message_for(&self, err: &ApiError) -> String {
        self.extract(err).unwrap_or_else(|| self.fallback.clone())
    }
}

fn message_of(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s,
        Value::Object(obj) => obj.get("message")?.as_str()?,
        _ => return None,
    };
    (!s.trim().is_empty()).then(|| s.to_string())
}
