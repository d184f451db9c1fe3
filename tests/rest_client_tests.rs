//! RestBackendClient contra un backend simulado en 127.0.0.1

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use loadboard::clients::fixtures::{sample_bid, sample_request, sample_truck};
use loadboard::clients::{LoadBoardBackend, RestBackendClient};
use loadboard::models::{AccountType, Bid, BidStatus, Session, TruckStatus, TruckStatusUpdate};
use loadboard::services::truck_reconciler::plan_update;
use loadboard::utils::errors::AppError;

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    query: Option<String>,
    auth: Option<String>,
    body: String,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

async fn mock_backend(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    log.lock().await.push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        auth: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let request = sample_request("R1", "C1", 2);
    let truck = sample_truck("K1", "T1");

    match (method.as_str(), uri.path()) {
        ("GET", "/api/requests/pending") => Json(vec![request]).into_response(),
        ("GET", "/api/requests/R1/bids") => (StatusCode::OK, "not json").into_response(),
        ("GET", "/api/bids/trucker") => Json(Vec::<Bid>::new()).into_response(),
        ("GET", "/api/bids/missing") => (StatusCode::NOT_FOUND, "Bid not found").into_response(),
        ("GET", "/api/bids/B1") => Json(sample_bid("B1", &request, &truck, BidStatus::Accepted)).into_response(),
        ("POST", "/api/bids/B7/accept") => (StatusCode::CONFLICT, "Bid already accepted").into_response(),
        ("GET", "/api/trucks") => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(vec![truck]).into_response()
        }
        ("PATCH", _) | ("POST", _) => StatusCode::NO_CONTENT.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_backend() -> (String, Log) {
    let log = Log::default();
    let app = Router::new().fallback(mock_backend).with_state(log.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api/", addr), log)
}

fn trucker() -> Session {
    Session::new("token-123", "T1", AccountType::Trucker)
}

#[tokio::test]
async fn test_pending_requests_sends_bearer_token() {
    let (base_url, log) = spawn_backend().await;
    let client = RestBackendClient::new(base_url, Duration::from_secs(5)).unwrap();

    let requests = client.pending_requests(&trucker()).await.unwrap();

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].id, "R1");
    let log = log.lock().await;
    assert_eq!(log[0].method, Method::GET);
    assert_eq!(log[0].path, "/api/requests/pending");
    assert_eq!(log[0].auth.as_deref(), Some("Bearer token-123"));
}

#[tokio::test]
async fn test_request_mirror_write_carries_bid_id() {
    let (base_url, log) = spawn_backend().await;
    let client = RestBackendClient::new(base_url, Duration::from_secs(5)).unwrap();

    client
        .update_request_status(&trucker(), "R 1", "B1", BidStatus::InTransit)
        .await
        .unwrap();

    let log = log.lock().await;
    assert_eq!(log[0].method, Method::PATCH);
    assert_eq!(log[0].path, "/api/requests/R%201/status");
    let body: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
    assert_eq!(body["status"], "in transit");
    assert_eq!(body["bidId"], "B1");
}

#[tokio::test]
async fn test_status_filter_is_sent_as_query() {
    let (base_url, log) = spawn_backend().await;
    let client = RestBackendClient::new(base_url, Duration::from_secs(5)).unwrap();

    client.trucker_bids(&trucker(), Some(BidStatus::Accepted)).await.unwrap();
    client.trucker_bids(&trucker(), None).await.unwrap();

    let log = log.lock().await;
    assert_eq!(log[0].query.as_deref(), Some("status=accepted"));
    assert!(log[1].query.as_deref().unwrap_or("").is_empty());
}

#[tokio::test]
async fn test_truck_update_payload() {
    let (base_url, log) = spawn_backend().await;
    let client = RestBackendClient::new(base_url, Duration::from_secs(5)).unwrap();
    let bid = client.bid(&trucker(), "B1").await.unwrap();

    let update: TruckStatusUpdate = plan_update(BidStatus::Loaded, Some(&bid.current_load()));
    client.update_truck_status(&trucker(), "K1", &update).await.unwrap();

    let log = log.lock().await;
    let body: serde_json::Value = serde_json::from_str(&log[1].body).unwrap();
    assert_eq!(log[1].path, "/api/trucks/K1/status");
    assert_eq!(body["status"], TruckStatus::Loaded.as_str());
    assert_eq!(body["currentLoad"]["bidId"], "B1");
}

#[tokio::test]
async fn test_error_statuses_are_mapped() {
    let (base_url, _) = spawn_backend().await;
    let client = RestBackendClient::new(base_url, Duration::from_secs(5)).unwrap();

    assert!(matches!(client.bid(&trucker(), "missing").await, Err(AppError::NotFound(_))));
    assert!(matches!(client.accept_bid(&trucker(), "B7").await, Err(AppError::Conflict(_))));
    assert!(matches!(
        client.request_bids(&trucker(), "R1").await,
        Err(AppError::Backend { status: 200, .. })
    ));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (base_url, _) = spawn_backend().await;
    let client = RestBackendClient::new(base_url, Duration::from_millis(100)).unwrap();

    let result = client.trucks(&trucker()).await;
    assert!(matches!(result, Err(AppError::Timeout(_))));
}
