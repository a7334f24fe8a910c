use std::sync::Arc;
use std::time::Instant;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::{
    ApiError, HTTP_USER_AGENT,
    config::HttpConfig,
    interceptor::Interceptors,
    notify::{NotificationSink, notifications},
};

/// The transport envelope: everything the server sent back.
///
/// Response interceptors see this; callers only ever get the payload.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// The body as JSON. An empty body is `null`; a body that is not JSON is
    /// returned as a JSON string.
    pub fn payload(&self) -> Value {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::deserialization(e, &self.body))
    }

    /// Unwraps the backend's `{ "data": ... }` envelope.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        self.json::<DataEnvelope<T>>().map(|env| env.data)
    }
}

#[derive(serde::Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Configured client for the backend under `/api`.
///
/// Cheap to clone; clones share the connection pool and interceptor chain.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    interceptors: Arc<Interceptors>,
}

impl ApiClient {
    pub fn new(config: &HttpConfig, interceptors: Interceptors) -> Result<Self, ApiError> {
        let base = config.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(HTTP_USER_AGENT)
            .build()
            .map_err(|e| ApiError::Build(e.to_string()))?;
        tracing::debug!(%base, timeout_ms = config.timeout_ms, "api client ready");
        Ok(Self {
            http,
            base,
            interceptors: Arc::new(interceptors),
        })
    }

    /// Client with the standard chain, notifying through `sink`.
    pub fn with_sink(config: &HttpConfig, sink: Arc<dyn NotificationSink>) -> Result<Self, ApiError> {
        Self::new(config, Interceptors::standard(config.extractor(), sink))
    }

    /// Client with the standard chain, notifying through the process-wide bus.
    pub fn from_config(config: &HttpConfig) -> Result<Self, ApiError> {
        Self::with_sink(config, Arc::new(notifications().clone()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    /// Resolve `path` underneath the base URL. Leading slashes are ignored, so
    /// `/health` and `health` both land on `<origin>/api/health`.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Build(format!("invalid path {path:?}: {e}")))
    }

    pub fn request(&self, method: Method, path: &str) -> ApiRequest<'_> {
        let builder = self.url(path).map(|url| self.http.request(method, url));
        ApiRequest {
            client: self,
            builder,
        }
    }

    pub fn get(&self, path: &str) -> ApiRequest<'_> {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> ApiRequest<'_> {
        self.request(Method::POST, path)
    }

    /// Runs the whole pipeline. Every failure, including one from `unwrap`,
    /// passes through the error hooks exactly once.
    async fn run<T>(
        &self,
        builder: Result<reqwest::RequestBuilder, ApiError>,
        unwrap: impl FnOnce(ApiResponse) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let outcome = async {
            let request = builder?
                .build()
                .map_err(|e| ApiError::Build(e.to_string()))?;
            let request = self.interceptors.apply_request(request)?;
            let response = self.transport(request).await?;
            let response = self.interceptors.apply_response(response)?;
            unwrap(response)
        }
        .await;
        outcome.map_err(|e| self.interceptors.apply_error(e))
    }

    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    async fn transport(&self, request: reqwest::Request) -> Result<ApiResponse, ApiError> {
        let url = request.url().clone();
        let started = Instant::now();

        let resp = self
            .http
            .execute(request)
            .await
            .map_err(|e| ApiError::from_transport(e, &url))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ApiError::from_transport(e, &url))?
            .to_vec();

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        if !status.is_success() {
            return Err(ApiError::from_status(status, &url, &body));
        }
        Ok(ApiResponse {
            status,
            url,
            headers,
            body,
        })
    }
}

/// A request being assembled. Construction errors are held until send time
/// so they take the same error path as transport failures.
#[must_use = "requests do nothing unless sent"]
pub struct ApiRequest<'a> {
    client: &'a ApiClient,
    builder: Result<reqwest::RequestBuilder, ApiError>,
}

impl<'a> ApiRequest<'a> {
    /// Apply a fallible change to the underlying builder.
    pub fn and_then(
        mut self,
        f: impl FnOnce(reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError>,
    ) -> Self {
        self.builder = self.builder.and_then(f);
        self
    }

    fn map(self, f: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder) -> Self {
        self.and_then(|b| Ok(f(b)))
    }

    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.map(|b| b.json(body))
    }

    /// Send and yield the body payload.
    pub async fn send(self) -> Result<Value, ApiError> {
        self.client.run(self.builder, |resp| Ok(resp.payload())).await
    }

    /// Send and deserialize the body as `T`.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        self.client.run(self.builder, |resp| resp.json::<T>()).await
    }

    /// Send and yield the contents of the `{ "data": ... }` envelope as `T`.
    pub async fn fetch_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        self.client.run(self.builder, |resp| resp.data::<T>()).await
    }
}
