use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response as AxumResponse},
    Json, Router,
};
use shared::error::ErrorCode;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: Method,
    path: String,
    body: String,
}

#[derive(Clone)]
struct DeviceState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    reject_with: Option<StatusCode>,
}

async fn record_request(
    State(state): State<DeviceState>,
    method: Method,
    uri: Uri,
    body: String,
) -> AxumResponse {
    state.requests.lock().await.push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        body,
    });
    match state.reject_with {
        Some(status) => (
            status,
            Json(ApiError::new(ErrorCode::NotFound, "no such endpoint")),
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn spawn_device(
    reject_with: Option<StatusCode>,
) -> anyhow::Result<(String, Arc<Mutex<Vec<RecordedRequest>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record_request).with_state(DeviceState {
        requests: Arc::clone(&requests),
        reject_with,
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), requests))
}

async fn only_request(requests: &Arc<Mutex<Vec<RecordedRequest>>>) -> RecordedRequest {
    let guard = requests.lock().await;
    assert_eq!(guard.len(), 1, "requests: {guard:?}");
    guard[0].clone()
}

#[tokio::test]
async fn subscribe_puts_subscription_document() {
    let (url, requests) = spawn_device(None).await.expect("device");
    let gateway = HttpGateway::new(url);

    gateway
        .subscribe(&EndpointName::new("EngineSpeed"), 15)
        .await
        .expect("subscribe");

    let req = only_request(&requests).await;
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.path, "/ws/subscriptions/EngineSpeed~sub");
    let body: SubscriptionRequest = serde_json::from_str(&req.body).expect("json body");
    assert_eq!(
        body,
        SubscriptionRequest::new(&EndpointName::new("EngineSpeed"), 15)
    );
}

#[tokio::test]
async fn unsubscribe_deletes_subscription() {
    let (url, requests) = spawn_device(None).await.expect("device");
    let gateway = HttpGateway::new(url);

    gateway
        .unsubscribe(&EndpointName::new("EngineSpeed"))
        .await
        .expect("unsubscribe");

    let req = only_request(&requests).await;
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.path, "/ws/subscriptions/EngineSpeed~sub");
}

#[tokio::test]
async fn create_alarm_puts_alarm_document_under_kind() {
    let (url, requests) = spawn_device(None).await.expect("device");
    let gateway = HttpGateway::new(url);

    gateway
        .create_alarm(&EndpointName::new("FuelLevel"), AlarmKind::Below, 10, 12.5)
        .await
        .expect("create alarm");

    let req = only_request(&requests).await;
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.path, "/ws/alarms/FuelLevel~below");
    let body: serde_json::Value = serde_json::from_str(&req.body).expect("json body");
    assert_eq!(body["alarm"]["type"], "below");
    assert_eq!(body["alarm"]["threshold"], 12.5);
    assert_eq!(body["alarm"]["interval"], 10);
}

#[tokio::test]
async fn remove_alarm_deletes_alarm_for_kind() {
    let (url, requests) = spawn_device(None).await.expect("device");
    let gateway = HttpGateway::new(url);

    gateway
        .remove_alarm(&EndpointName::new("FuelLevel"), AlarmKind::Change)
        .await
        .expect("remove alarm");

    let req = only_request(&requests).await;
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.path, "/ws/alarms/FuelLevel~change");
}

#[tokio::test]
async fn rejected_request_surfaces_device_message() {
    let (url, _requests) = spawn_device(Some(StatusCode::NOT_FOUND))
        .await
        .expect("device");
    let gateway = HttpGateway::new(url);

    let err = gateway
        .subscribe(&EndpointName::new("Nope"), 1)
        .await
        .expect_err("must fail");
    match err.downcast_ref::<GatewayError>() {
        Some(GatewayError::Rejected { status, message }) => {
            assert_eq!(*status, 404);
            assert_eq!(message, "no such endpoint");
        }
        other => panic!("unexpected error: {other:?} ({err})"),
    }
}

#[tokio::test]
async fn unreachable_device_reports_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = HttpGateway::new(format!("http://{addr}"));
    let err = gateway
        .unsubscribe(&EndpointName::new("EngineSpeed"))
        .await
        .expect_err("must fail");
    assert!(
        err.to_string().contains("failed to reach device"),
        "unexpected error: {err}"
    );
}
