//! Network capture: filtering, de-duplication, content-addressed storage and
//! session lifetime.
mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::header;
use axum::routing::get;
use card_buyback_lib::infrastructure::config::SheetSource;
use card_buyback_lib::infrastructure::strategies::NetworkMonitorStrategy;
use card_buyback_lib::infrastructure::strategies::network_monitor::CaptureTimings;
use card_buyback_lib::infrastructure::{
    BrowserDriver, BrowserSession, ExecutionContext, FetchError, FetchResult, FetchStrategy,
    HttpResourceDriver, ImageStore, ObservedResponse,
};
use common::{spawn_server, test_client};
use tokio::time::Instant;

const TIMINGS: CaptureTimings = CaptureTimings {
    navigation_timeout: Duration::from_secs(5),
    settle: Duration::from_secs(2),
    sheet_delay: Duration::ZERO,
};

#[derive(Default)]
struct SessionLog {
    launched: AtomicUsize,
    closed: AtomicBool,
    pages: Mutex<Vec<Instant>>,
}

/// Replays a fixed list of responses for every page, or fails every page.
struct ScriptedDriver {
    responses: Vec<ObservedResponse>,
    fail: bool,
    log: Arc<SessionLog>,
}

struct ScriptedSession {
    responses: Vec<ObservedResponse>,
    fail: bool,
    log: Arc<SessionLog>,
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn launch(&self) -> FetchResult<Box<dyn BrowserSession>> {
        self.log.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            responses: self.responses.clone(),
            fail: self.fail,
            log: self.log.clone(),
        }))
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn capture_responses(
        &mut self,
        url: &str,
        _navigation_timeout: Duration,
        _settle: Duration,
    ) -> FetchResult<Vec<ObservedResponse>> {
        self.log.pages.lock().unwrap().push(Instant::now());
        if self.fail {
            return Err(FetchError::Timeout { seconds: 60, url: url.to_string() });
        }
        Ok(self.responses.clone())
    }

    async fn close(self: Box<Self>) -> FetchResult<()> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn observed(url: String, status: u16, content_type: &str) -> ObservedResponse {
    ObservedResponse { url, status, content_type: Some(content_type.to_string()) }
}

fn image_server() -> Router {
    Router::new()
        .route("/card/a=s100", get(|| async { ([(header::CONTENT_TYPE, "image/png")], b"png-a".to_vec()) }))
        .route("/card/a=s400", get(|| async { ([(header::CONTENT_TYPE, "image/png")], b"png-a".to_vec()) }))
        .route("/card/b", get(|| async { ([(header::CONTENT_TYPE, "image/jpeg")], b"jpg-b".to_vec()) }))
}

fn strategy(context: ExecutionContext, base: &str, store: ImageStore) -> NetworkMonitorStrategy {
    NetworkMonitorStrategy::new(
        context,
        test_client(),
        store,
        format!("{base}/pubhtml"),
        vec![SheetSource::new("1", "ar"), SheetSource::new("2", "sr")],
        TIMINGS,
    )
    .with_capture_host("127.0.0.1")
}

#[tokio::test]
async fn captures_deduplicates_and_stores_images() {
    let base = spawn_server(image_server()).await;
    let store_dir = tempfile::tempdir().unwrap();
    let log = Arc::new(SessionLog::default());
    let driver = ScriptedDriver {
        responses: vec![
            observed(format!("{base}/card/a=s100"), 200, "image/png"),
            observed(format!("{base}/card/a=s400"), 200, "image/png"),
            observed(format!("{base}/card/b"), 200, "image/jpeg"),
            observed(format!("{base}/card/c"), 404, "image/png"),
            observed(format!("{base}/pubhtml"), 200, "text/html"),
            observed("https://example.com/x.png".to_string(), 200, "image/png"),
        ],
        fail: false,
        log: log.clone(),
    };
    let context = ExecutionContext::browser(Arc::new(driver), None);

    let records = strategy(context, &base, ImageStore::new(store_dir.path())).fetch().await.unwrap();

    // the second sheet replays the same URLs, so nothing new is kept
    assert_eq!(records.len(), 2);
    assert!(records[0].title.starts_with("AR Card "));
    assert!(records[0].image_url.starts_with("/images/cards/ar/"));
    assert!(records[0].image_url.ends_with(".png"));
    assert!(records[1].image_url.ends_with(".jpg"));
    assert!(records.iter().all(|r| r.character_name.is_empty() && r.model_number.is_empty()));

    let file_name = records[0].image_url.rsplit('/').next().unwrap();
    let stored = store_dir.path().join("cards").join("ar").join(file_name);
    assert_eq!(std::fs::read(stored).unwrap(), b"png-a");

    assert_eq!(log.launched.load(Ordering::SeqCst), 1);
    assert!(log.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn session_is_closed_when_every_page_fails() {
    let store_dir = tempfile::tempdir().unwrap();
    let log = Arc::new(SessionLog::default());
    let driver = ScriptedDriver { responses: Vec::new(), fail: true, log: log.clone() };
    let context = ExecutionContext::browser(Arc::new(driver), None);

    let records = strategy(context, "http://127.0.0.1:9", ImageStore::new(store_dir.path()))
        .fetch()
        .await
        .unwrap();

    assert!(records.is_empty());
    assert!(log.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn server_context_skips_capture() {
    let store_dir = tempfile::tempdir().unwrap();
    let records = strategy(ExecutionContext::server(), "http://127.0.0.1:9", ImageStore::new(store_dir.path()))
        .fetch()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn http_resource_driver_reports_page_images() {
    let page = r#"<html><body><table>
        <tr><td><img src="/card/a=s100"></td><td><img src="/card/b"></td></tr>
        <tr><td><img src="/missing.png"></td></tr>
        </table></body></html>"#;
    let app = image_server().route("/pubhtml", get(move || async move { axum::response::Html(page) }));
    let base = spawn_server(app).await;
    let store_dir = tempfile::tempdir().unwrap();

    let driver = HttpResourceDriver::new(test_client());
    let mut session = driver.launch().await.unwrap();
    let responses = session
        .capture_responses(&format!("{base}/pubhtml"), Duration::from_secs(5), Duration::from_secs(2))
        .await
        .unwrap();
    session.close().await.unwrap();

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].status, 200);
    assert!(responses[0].is_image());
    assert_eq!(responses[2].status, 404);

    let context = ExecutionContext::browser(Arc::new(HttpResourceDriver::new(test_client())), None);
    let records = strategy(context, &base, ImageStore::new(store_dir.path())).fetch().await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn capture_waits_between_sheets_only() {
    let delay = Duration::from_millis(1000);
    let store_dir = tempfile::tempdir().unwrap();
    let log = Arc::new(SessionLog::default());
    let driver = ScriptedDriver { responses: Vec::new(), fail: false, log: log.clone() };
    let strategy = NetworkMonitorStrategy::new(
        ExecutionContext::browser(Arc::new(driver), None),
        test_client(),
        ImageStore::new(store_dir.path()),
        "http://127.0.0.1:9/pubhtml",
        vec![SheetSource::new("1", "ar"), SheetSource::new("2", "sr"), SheetSource::new("3", "sar")],
        CaptureTimings { sheet_delay: delay, ..TIMINGS },
    );

    let started = Instant::now();
    let records = strategy.fetch().await.unwrap();

    assert!(records.is_empty());
    assert!(started.elapsed() >= delay * 2);

    let pages = log.pages.lock().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0], started);
    for pair in pages.windows(2) {
        assert!(pair[1] - pair[0] >= delay);
    }
}
