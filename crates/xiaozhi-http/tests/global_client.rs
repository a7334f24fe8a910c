//! The process-wide client and bus. Own test binary, so nothing else touches
//! the globals first.

use httpmock::prelude::*;
use serde_json::json;
use xiaozhi_http::{ApiError, HttpConfig, api, init_api, notifications};

#[tokio::test]
async fn init_once_then_share() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/missing");
            then.status(404).json_body(json!({ "error": "接口不存在" }));
        })
        .await;

    let cfg = HttpConfig::default().with_origin(server.base_url());
    let first = init_api(&cfg).unwrap();
    assert!(std::ptr::eq(first, api().unwrap()));
    assert_eq!(
        first.base_url().as_str(),
        format!("{}/api/", server.base_url())
    );

    let again = init_api(&HttpConfig::default()).unwrap_err();
    assert!(matches!(again, ApiError::Build(_)), "{again:?}");

    let mut rx = notifications().subscribe();
    api().unwrap().get("missing").send().await.unwrap_err();
    assert_eq!(rx.try_recv().unwrap().message, "接口不存在");
}
