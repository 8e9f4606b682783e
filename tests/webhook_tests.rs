mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tradebridge::adapter::webhook::{build_router, ApiResponse};

use support::Harness;

async fn post(h: &Harness, body: &str) -> (StatusCode, ApiResponse) {
    let response = build_router(h.orchestrator.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/tradingview")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn index_says_welcome() {
    let h = Harness::new();
    let response = build_router(h.orchestrator.clone())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"welcome");
}

#[tokio::test]
async fn accepted_command_answers_success() {
    let h = Harness::new();

    let (status, body) = post(&h, "  ETHUSDT_LONG_500_true_true_true\n").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ApiResponse::success());
    assert_eq!(h.exchange.placed_orders().len(), 3);
}

#[tokio::test]
async fn malformed_command_is_a_bad_request() {
    let h = Harness::new();

    let (status, body) = post(&h, "ETHUSDT_UP_500").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, -1);
    assert!(body.message.contains("invalid side"));
    assert!(h.exchange.calls().is_empty());
}

#[tokio::test]
async fn debounced_command_is_a_bad_request() {
    let h = Harness::new();

    post(&h, "ETHUSDT_LONG_500_false_false").await;
    let (status, body) = post(&h, "ETHUSDT_LONG_500_false_false").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.message.starts_with("delay open order"));
}

#[tokio::test]
async fn skipped_command_answers_success() {
    let h = Harness::new();
    h.exchange.add_open_order(tradebridge::domain::OpenOrder {
        order_id: tradebridge::domain::OrderId(1),
        symbol: "ETHUSDT".into(),
        side: tradebridge::domain::OrderSide::Sell,
        position_side: tradebridge::domain::PositionSide::Long,
        order_type: tradebridge::domain::OrderType::StopMarket,
    });

    let (status, body) = post(&h, "ETHUSDT_LONG_500_true_true_true_true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.code, 0);
    assert!(h.exchange.placed_orders().is_empty());
}
