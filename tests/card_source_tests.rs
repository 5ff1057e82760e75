//! Price list loading against a local CSV endpoint
mod common;

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::get;
use card_buyback_lib::infrastructure::CardDataSource;
use common::{PRICE_CSV, spawn_server, test_client};

async fn csv_if_not_cached(headers: HeaderMap) -> (StatusCode, String) {
    let no_store = headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("no-store"));
    if no_store {
        (StatusCode::OK, PRICE_CSV.to_string())
    } else {
        (StatusCode::BAD_REQUEST, "cache headers missing".to_string())
    }
}

#[tokio::test]
async fn loads_and_buckets_price_list_with_no_store_headers() {
    let base = spawn_server(Router::new().route("/csv", get(csv_if_not_cached))).await;
    let source = CardDataSource::new(test_client(), format!("{base}/csv"));

    let data = source.fetch_card_data().await;
    assert_eq!(data.card_count(), 3);
    assert_eq!(data.get("¥1,200").unwrap()[0].model_number, "100/086");
    assert_eq!(data.get("最低保証").unwrap()[0].title, "ミュウ プロモ");
    assert!(data.cards().all(|c| !c.card_id.contains('/')));
}

#[tokio::test]
async fn header_only_csv_is_empty_not_error() {
    let app = Router::new().route(
        "/csv",
        get(|| async { "買取価格表,,,\n商品タイトル,商品型番,レアリティ,買取価格\n" }),
    );
    let base = spawn_server(app).await;
    let source = CardDataSource::new(test_client(), format!("{base}/csv"));

    let data = source.try_fetch_card_data().await.unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn server_error_yields_empty_card_data() {
    let app = Router::new().route("/csv", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
    let base = spawn_server(app).await;
    let source = CardDataSource::new(test_client(), format!("{base}/csv"));

    assert!(source.try_fetch_card_data().await.is_err());
    assert!(source.fetch_card_data().await.is_empty());
}
