//! Shared fixtures: a local HTTP server standing in for the spreadsheet
//! endpoints, plus a test configuration pointing at it.

#![allow(dead_code)]

use axum::Router;
use card_buyback_lib::infrastructure::config::SheetSource;
use card_buyback_lib::infrastructure::{AppConfig, HttpClient, HttpClientConfig};

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Single-attempt client with short timeouts.
pub fn test_client() -> HttpClient {
    HttpClient::with_config(HttpClientConfig {
        timeout_seconds: 5,
        max_retries: 1,
        retry_base_delay_ms: 10,
        ..HttpClientConfig::default()
    })
    .unwrap()
}

/// Configuration with every remote source on `base` and no delays.
pub fn test_config(base: &str, sheets: &[(&str, &str)]) -> AppConfig {
    let mut config = AppConfig::default();
    config.sources.card_csv_url = format!("{base}/csv");
    config.sources.published_sheet_url = format!("{base}/pubhtml");
    config.sources.sheets = sheets
        .iter()
        .map(|(gid, category)| SheetSource::new(gid, category))
        .collect();
    config.http.max_retries = 1;
    config.http.timeout_seconds = 5;
    config.fetch.sheet_request_delay_ms = 0;
    config.fetch.browser_sheet_delay_ms = 0;
    config.fetch.settle_wait_seconds = 2;
    config
}

pub const PRICE_CSV: &str = "買取価格表,,,\n\
商品タイトル,商品型番,レアリティ,買取価格\n\
【状態A】ピカチュウ AR sv11b 100/086,100/086,AR,\"¥1,200\"\n\
リザードン SAR sv11b 101/086,101/086,SAR,\"¥5,000\"\n\
ミュウ プロモ,PROMO,P,最低保証\n";

/// Published-sheet table with one row per `(title, image cell html)`.
pub fn sheet_html(rows: &[(&str, &str)]) -> String {
    let mut html = String::from(
        "<html><body><table>\
         <tr><td>1</td><td></td><td>商品タイトル</td><td>検索ワード</td><td>画像URL</td></tr>",
    );
    for (i, (title, image_cell)) in rows.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>x</td><td>{title}</td><td>q</td><td>{image_cell}</td></tr>",
            i + 2
        ));
    }
    html.push_str("</table></body></html>");
    html
}
