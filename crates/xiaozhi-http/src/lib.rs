//! HTTP client for the label-analysis backend.
//!
//! Every request goes to `<origin>/api/...` and runs through an explicit
//! [`Interceptors`] chain. On success the caller gets the body payload only;
//! on failure a message is pulled from the error body (or a fallback is
//! used), published as a [`Notice`], and the error is still returned.
//!
//! ```rust,ignore
//! let rows = xiaozhi_http::api()?.sql_query("SELECT * FROM data").await?;
//! ```

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod extract;
pub mod interceptor;
pub mod notify;

pub use client::{ApiClient, ApiRequest, ApiResponse};
pub use config::HttpConfig;
pub use endpoints::{
    AnalysisType, AnalyzeRequest, DataType, Health, LabelCount, LabelRequest, MetricRow,
    Platform, SqlRow,
};
pub use error::ApiError;
pub use extract::ErrorExtractor;
pub use interceptor::{
    Interceptors, NotifyOnError, PassThrough, RequestInterceptor, ResponseInterceptor,
};
pub use notify::{Notice, NotificationBus, NotificationSink, notifications};

use once_cell::sync::OnceCell;

/// Where requests go when nothing else is configured; the dev backend.
pub const DEFAULT_ORIGIN: &str = "http://localhost:5000";
pub const DEFAULT_BASE_PATH: &str = "/api";
/// 60 seconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
/// Shown when a failure carries no message of its own.
pub const FALLBACK_MESSAGE: &str = "request failed";
pub const HTTP_USER_AGENT: &str = concat!("xiaozhi-web/", env!("CARGO_PKG_VERSION"));

static API: OnceCell<ApiClient> = OnceCell::new();

/// The process-wide client. Built from [`HttpConfig::default`] on first use
/// unless [`init_api`] ran earlier.
pub fn api() -> Result<&'static ApiClient, ApiError> {
    API.get_or_try_init(|| ApiClient::from_config(&HttpConfig::default()))
}

/// Build the process-wide client from `config`. Fails if it already exists.
pub fn init_api(config: &HttpConfig) -> Result<&'static ApiClient, ApiError> {
    let client = ApiClient::from_config(config)?;
    API.set(client)
        .map_err(|_| ApiError::Build("api client already initialised".to_string()))?;
    api()
}
