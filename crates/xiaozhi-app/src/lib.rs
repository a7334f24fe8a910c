//! Composition root: loads settings, installs logging, and joins the file
//! selection with the API client.

pub mod config;
pub mod context;
pub mod error;
pub mod tracing_setup;

pub use config::{AppConfig, LoggingConfig};
pub use context::AppContext;
pub use error::AppError;

use tokio::sync::broadcast::{self, error::TryRecvError};
use xiaozhi_error::Severity;
use xiaozhi_http::Notice;

pub async fn try_main() -> color_eyre::Result<()> {
    let config = AppConfig::load()?;
    let _logging = tracing_setup::init_tracing(&config.logging)?;
    tracing::debug!(?config, "configuration loaded");

    let ctx = AppContext::global(config)?;
    let mut notices = ctx.bus().subscribe();

    // Error hooks publish before the call returns, so everything is queued by now.
    let health = ctx.client().health().await;
    drain_notices(&mut notices);

    let health = health?;
    if health.is_ok() {
        println!("backend at {} is up", ctx.client().base_url());
    } else {
        println!("backend at {} reports {:?}", ctx.client().base_url(), health.status);
    }
    Ok(())
}

/// Show every notice already queued on `rx`. Returns how many were shown.
pub fn drain_notices(rx: &mut broadcast::Receiver<Notice>) -> usize {
    let mut shown = 0;
    loop {
        match rx.try_recv() {
            Ok(notice) => {
                show_notice(&notice);
                shown += 1;
            }
            Err(TryRecvError::Lagged(n)) => tracing::warn!(skipped = n, "notices dropped"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => return shown,
        }
    }
}

fn show_notice(notice: &Notice) {
    match notice.level {
        Severity::Info => tracing::info!(target: "xiaozhi::notice", "{}", notice.message),
        Severity::Warning => tracing::warn!(target: "xiaozhi::notice", "{}", notice.message),
        Severity::Error | Severity::Fatal => {
            eprintln!("{}", notice.message);
            tracing::error!(target: "xiaozhi::notice", "{}", notice.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use xiaozhi_http::{ApiClient, HttpConfig, NotificationBus};

    use super::*;

    #[test]
    fn drain_shows_everything_queued_then_stops() {
        let bus = NotificationBus::new(8);
        let mut rx = bus.subscribe();
        bus.info("上传成功");
        bus.error("请求失败");

        assert_eq!(drain_notices(&mut rx), 2);
        assert_eq!(drain_notices(&mut rx), 0);
    }

    #[test]
    fn drain_survives_a_lagged_receiver() {
        let bus = NotificationBus::new(2);
        let mut rx = bus.subscribe();
        for i in 0..5 {
            bus.warning(format!("notice {i}"));
        }
        // The two newest are still there after the lag is reported.
        assert_eq!(drain_notices(&mut rx), 2);
    }

    #[tokio::test]
    async fn failed_call_leaves_its_notice_ready_to_drain() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(503).json_body(serde_json::json!({ "error": "维护中" }));
            })
            .await;

        let bus = NotificationBus::new(8);
        let mut rx = bus.subscribe();
        let cfg = HttpConfig::default().with_origin(server.base_url());
        let client = ApiClient::with_sink(&cfg, Arc::new(bus)).unwrap();

        assert!(client.health().await.is_err());
        assert_eq!(drain_notices(&mut rx), 1);
    }
}
