use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use reqwest::header::{HeaderName, HeaderValue};
use serde_json::{Value, json};
use tokio::sync::broadcast::Receiver;
use xiaozhi_error::Severity;
use xiaozhi_http::{
    ApiClient, ApiError, ApiResponse, ErrorExtractor, FALLBACK_MESSAGE, HttpConfig, Interceptors,
    Notice, NotificationBus, RequestInterceptor, ResponseInterceptor,
};

fn config_for(server: &MockServer) -> HttpConfig {
    HttpConfig::default().with_origin(server.base_url())
}

fn client_with_bus(cfg: &HttpConfig) -> (ApiClient, Receiver<Notice>) {
    let _guard = xiaozhi_test_utils::init_tracing_tests(tracing::Level::DEBUG);
    let bus = NotificationBus::new(16);
    let rx = bus.subscribe();
    let client = ApiClient::with_sink(cfg, Arc::new(bus)).unwrap();
    (client, rx)
}

#[tokio::test]
async fn success_yields_body_payload_not_the_envelope() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/health");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "status": "ok" }));
        })
        .await;

    let (client, mut rx) = client_with_bus(&config_for(&server));
    let body = client.get("/health").send().await.unwrap();

    m.assert_async().await;
    assert_eq!(body, json!({ "status": "ok" }));
    assert!(rx.try_recv().is_err(), "success must not notify");
}

#[tokio::test]
async fn fetch_data_yields_exactly_the_inner_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/rows");
            then.status(200)
                .json_body(json!({ "data": [{ "deviceId": "a1" }, { "deviceId": "b2" }] }));
        })
        .await;

    let (client, _rx) = client_with_bus(&config_for(&server));
    let rows: Vec<Value> = client.get("rows").fetch_data().await.unwrap();
    assert_eq!(rows, vec![json!({ "deviceId": "a1" }), json!({ "deviceId": "b2" })]);
}

#[tokio::test]
async fn error_field_is_notified_and_the_call_rejects() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/analyze");
            then.status(400).json_body(json!({ "error": "不支持的文件格式" }));
        })
        .await;

    let (client, mut rx) = client_with_bus(&config_for(&server));
    let err = client.post("analyze").send().await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.body().unwrap()["error"], "不支持的文件格式");
    let notice = rx.try_recv().unwrap();
    assert_eq!(notice.level, Severity::Error);
    assert_eq!(notice.message, "不支持的文件格式");
    assert!(rx.try_recv().is_err(), "exactly one notice per failure");
}

#[tokio::test]
async fn missing_error_field_uses_the_fallback() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/broken");
            then.status(502).body("<html>Bad Gateway</html>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/other");
            then.status(500).json_body(json!({ "detail": "db locked" }));
        })
        .await;

    let (client, mut rx) = client_with_bus(&config_for(&server));

    let err = client.get("broken").send().await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 502, body: None, .. }), "{err:?}");
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);

    let err = client.get("other").send().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);
}

#[tokio::test]
async fn timeout_is_a_failure_with_fallback_notice() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/slow");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "data": 1 }));
        })
        .await;

    let cfg = config_for(&server).with_timeout(Duration::from_millis(200));
    let (client, mut rx) = client_with_bus(&cfg);

    let err = client.get("slow").fetch_data::<u32>().await.unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
    assert!(err.diagnostic().contains("timed out"));
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);
}

#[tokio::test]
async fn network_failure_takes_the_same_path() {
    // Nothing listens on the discard port.
    let cfg = HttpConfig::default()
        .with_origin("http://127.0.0.1:9")
        .with_timeout(Duration::from_secs(5));
    let (client, mut rx) = client_with_bus(&cfg);

    let err = client.get("health").send().await.unwrap_err();
    assert!(matches!(err, ApiError::Request { .. }), "{err:?}");
    assert_eq!(err.status(), None);
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);
}

#[tokio::test]
async fn concurrent_calls_resolve_independently() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/slow");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(json!({ "data": 42 }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/broken");
            then.status(500).json_body(json!({ "error": "boom" }));
        })
        .await;

    let (client, mut rx) = client_with_bus(&config_for(&server));
    let (slow, broken) = tokio::join!(
        client.get("slow").fetch_data::<u32>(),
        client.get("broken").send()
    );

    assert_eq!(slow.unwrap(), 42);
    assert!(broken.is_err());
    assert_eq!(rx.try_recv().unwrap().message, "boom");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn construction_errors_are_notified_without_sending() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200);
        })
        .await;

    let (client, mut rx) = client_with_bus(&config_for(&server));
    // JSON object keys must be strings.
    let mut bad = BTreeMap::new();
    bad.insert(vec![1u8], 1u8);

    let err = client.post("sql-query").json(&bad).send().await.unwrap_err();
    assert!(matches!(err, ApiError::Build(_)), "{err:?}");
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);
    assert_eq!(m.hits_async().await, 0);
}

#[derive(Debug)]
struct Offline;

impl RequestInterceptor for Offline {
    fn on_request(&self, _request: reqwest::Request) -> Result<reqwest::Request, ApiError> {
        Err(ApiError::Rejected("offline mode".into()))
    }
}

#[derive(Debug)]
struct Stamp;

impl RequestInterceptor for Stamp {
    fn on_request(&self, mut request: reqwest::Request) -> Result<reqwest::Request, ApiError> {
        request.headers_mut().insert(
            HeaderName::from_static("x-client"),
            HeaderValue::from_static("xiaozhi"),
        );
        Ok(request)
    }
}

#[derive(Debug)]
struct RequireJson;

impl ResponseInterceptor for RequireJson {
    fn on_response(&self, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        let is_json = response
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        if is_json {
            Ok(response)
        } else {
            Err(ApiError::Rejected("expected a JSON response".into()))
        }
    }
}

#[tokio::test]
async fn request_hooks_can_modify_or_reject() {
    let server = MockServer::start_async().await;
    let stamped = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/health").header("x-client", "xiaozhi");
            then.status(200).json_body(json!({ "status": "ok" }));
        })
        .await;

    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();
    let cfg = config_for(&server);
    let sink = Arc::new(bus);

    let client = ApiClient::new(
        &cfg,
        Interceptors::standard(ErrorExtractor::default(), sink.clone()).with_request(Stamp),
    )
    .unwrap();
    assert_eq!(client.health().await.unwrap().status, "ok");
    stamped.assert_async().await;

    let offline = ApiClient::new(
        &cfg,
        Interceptors::standard(ErrorExtractor::default(), sink).with_request(Offline),
    )
    .unwrap();
    let err = offline.health().await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(_)), "{err:?}");
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);
    assert_eq!(stamped.hits_async().await, 1);
}

#[tokio::test]
async fn response_hooks_can_turn_success_into_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/page");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html></html>");
        })
        .await;

    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();
    let client = ApiClient::new(
        &config_for(&server),
        Interceptors::standard(ErrorExtractor::default(), Arc::new(bus)).with_response(RequireJson),
    )
    .unwrap();

    let err = client.get("page").send().await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(ref m) if m.contains("JSON")), "{err:?}");
    assert_eq!(rx.try_recv().unwrap().message, FALLBACK_MESSAGE);
}

#[tokio::test]
async fn custom_extractor_reads_other_error_shapes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2");
            then.status(422)
                .json_body(json!({ "detail": { "message": "deviceIds malformed" } }));
        })
        .await;

    let cfg = HttpConfig {
        error_pointers: vec!["/error".into(), "/detail".into()],
        fallback_message: "请求失败".into(),
        ..config_for(&server)
    };
    let (client, mut rx) = client_with_bus(&cfg);

    client.get("v2").send().await.unwrap_err();
    assert_eq!(rx.try_recv().unwrap().message, "deviceIds malformed");

    let (no_server, mut rx) = client_with_bus(&HttpConfig {
        origin: "http://127.0.0.1:9".into(),
        fallback_message: "请求失败".into(),
        ..HttpConfig::default()
    });
    no_server.get("v2").send().await.unwrap_err();
    assert_eq!(rx.try_recv().unwrap().message, "请求失败");
}
