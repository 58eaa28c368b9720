use axum::http::StatusCode;
use hyperlens::api::{self, AppState};
use hyperlens::datasource::{DataSource, MockDataSource};
use hyperlens::domain::{RawFill, RawSide};
use hyperlens::engine::BuilderFilter;
use hyperlens::services::pnl::DEFAULT_MAX_START_CAPITAL;
use hyperlens::services::{
    LeaderboardService, PnlService, PositionService, TradeService, UserRegistry,
};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

const USER: &str = "0x0000000000000000000000000000000000000123";
const TARGET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn setup_app(mock: MockDataSource, target: Option<&str>) -> axum::Router {
    let filter = BuilderFilter::new(target);
    let source: Arc<dyn DataSource> = Arc::new(mock);
    let trades = Arc::new(TradeService::new(
        Arc::clone(&source),
        Duration::from_secs(60),
        filter.clone(),
    ));
    let positions = Arc::new(PositionService::new(Arc::clone(&trades), filter.clone()));
    let pnl = Arc::new(PnlService::new(
        Arc::clone(&trades),
        Arc::clone(&source),
        Duration::from_secs(5),
        filter,
        DEFAULT_MAX_START_CAPITAL,
    ));
    let registry = Arc::new(UserRegistry::new());
    let leaderboard = Arc::new(LeaderboardService::new(Arc::clone(&pnl), Arc::clone(&registry)));

    api::create_router(AppState {
        source,
        trades,
        positions,
        pnl,
        leaderboard,
        registry,
    })
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_buy_then_sell_timeline() {
    let mock = MockDataSource::new().with_fills(
        USER,
        vec![
            RawFill::new("BTC", RawSide::B, "100", "1", 1000).with_fee("1"),
            RawFill::new("BTC", RawSide::A, "110", "1", 2000)
                .with_fee("1")
                .with_closed_pnl("10"),
        ],
    );
    let app = setup_app(mock, None);

    let (status, body) = request(
        app,
        &format!("/v1/positions/history?user={}&fromMs=0&toMs=10000", USER),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let positions = body["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0]["netSize"], 1.0);
    assert_eq!(positions[0]["avgEntryPx"], 100.0);
    assert_eq!(positions[0]["tainted"], false);
    assert_eq!(positions[1]["netSize"], 0.0);
    assert_eq!(positions[1]["avgEntryPx"], 0.0);
}

#[tokio::test]
async fn test_flip_reports_new_entry_price() {
    let mock = MockDataSource::new().with_fills(
        USER,
        vec![
            RawFill::new("ETH", RawSide::B, "100", "2", 1000),
            RawFill::new("ETH", RawSide::A, "120", "5", 2000),
        ],
    );
    let app = setup_app(mock, None);

    let (status, body) = request(
        app,
        &format!("/v1/positions/history?user={}&fromMs=0&toMs=10000", USER),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let positions = body["positions"].as_array().unwrap();
    let last = positions.last().unwrap();
    assert_eq!(last["netSize"], -3.0);
    assert_eq!(last["avgEntryPx"], 120.0);
    assert_eq!(last["coin"], "ETH");
}

#[tokio::test]
async fn test_builder_only_tainted_lifecycle_yields_no_states() {
    // Builder-attributed buy, then non-builder fills closing the position:
    // the whole lifecycle is contaminated, so builder-only output is empty.
    let mock = MockDataSource::new().with_fills(
        USER,
        vec![
            RawFill::new("BTC", RawSide::B, "100", "1", 1000).with_builder_fee("1"),
            RawFill::new("BTC", RawSide::B, "100", "1", 2000),
            RawFill::new("BTC", RawSide::A, "110", "2", 3000),
        ],
    );
    let app = setup_app(mock, Some(TARGET));

    let (status, body) = request(
        app,
        &format!(
            "/v1/positions/history?user={}&fromMs=0&toMs=10000&builderOnly=true",
            USER
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["positions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_coin_filter_restricts_timeline() {
    let mock = MockDataSource::new().with_fills(
        USER,
        vec![
            RawFill::new("BTC", RawSide::B, "100", "1", 1000),
            RawFill::new("ETH", RawSide::B, "10", "5", 1500),
        ],
    );
    let app = setup_app(mock, None);

    let (status, body) = request(
        app,
        &format!(
            "/v1/positions/history?user={}&coin=eth&fromMs=0&toMs=10000",
            USER
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let positions = body["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["coin"], "ETH");
}

#[tokio::test]
async fn test_invalid_address_is_400() {
    let app = setup_app(MockDataSource::new(), None);
    let (status, _) = request(app, "/v1/positions/history?user=banana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
