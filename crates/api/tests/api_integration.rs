//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_state() -> (axum::Router, Arc<api::AppState>) {
    let registry = catalog::commerce_registry().unwrap();
    let (state, _worker) = api::create_default_state(registry, 64);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

fn setup() -> axum::Router {
    setup_with_state().0
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Lets the audit writer drain until the log holds `expected` records.
async fn wait_for_audit(state: &api::AppState, expected: usize) {
    for _ in 0..100 {
        if state.audit_log.len().await >= expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("audit log never reached {expected} records");
}

fn view_order_request(principal_id: &str, owner_id: &str) -> Value {
    json!({
        "principal": {"id": principal_id, "permissions": ["order.view.own"]},
        "action": "view",
        "resource": {"type": "Order", "id": "10", "owner_id": owner_id}
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["policies"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_authorize_allows_owner() {
    let app = setup();

    let response = app
        .oneshot(post_json("/authorize", view_order_request("42", "42")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["allowed"], true);
    assert_eq!(json["resource_type"], "Order");
    assert_eq!(json["action"], "view");
}

#[tokio::test]
async fn test_authorize_denies_stranger_with_forbidden() {
    let app = setup();

    let response = app
        .oneshot(post_json("/authorize", view_order_request("7", "42")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["allowed"], false);
    assert_eq!(json["reason"], policy::NO_MATCHING_RULE);
}

#[tokio::test]
async fn test_authorize_uses_parent_ownership() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize",
            json!({
                "principal": {"id": "42", "permissions": ["order_item.update.own"]},
                "action": "update",
                "resource": {
                    "type": "OrderItem",
                    "id": "5",
                    "parent": {"type": "Order", "id": "10", "owner_id": "42"}
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unconfigured_action_is_server_error() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize",
            json!({
                "principal": {"id": "1", "roles": ["admin"]},
                "action": "teleport",
                "resource": {"type": "Order", "id": "10"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("teleport"));
}

#[tokio::test]
async fn test_empty_resource_type_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize",
            json!({
                "principal": {"id": "1"},
                "action": "view",
                "resource": {"type": "", "id": "10"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_untyped_resource_is_bad_request_with_json_error() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize",
            json!({
                "principal": {"id": "1"},
                "action": "view",
                "resource": {"id": "10"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("type"));
}

#[tokio::test]
async fn test_malformed_batch_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize/batch",
            json!({"principal": {"id": "1"}, "action": "delete"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_empty_principal_id_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize",
            json!({
                "principal": {"id": "", "permissions": ["order.view.own"]},
                "action": "view",
                "resource": {"type": "Order", "id": "1", "owner_id": ""}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_action_is_bad_request() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize",
            json!({
                "principal": {"id": "1"},
                "action": " ",
                "resource": {"type": "Order", "id": "10"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_reports_denied_resources() {
    let app = setup();

    let response = app
        .oneshot(post_json(
            "/authorize/batch",
            json!({
                "principal": {"id": "1", "permissions": ["employee_department.delete.any"]},
                "action": "delete",
                "resources": [
                    {"type": "EmployeeDepartment", "id": "1", "attributes": {"employee_count": 0}},
                    {"type": "EmployeeDepartment", "id": "2", "attributes": {"employee_count": 4}}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["allowed"], false);
    assert_eq!(json["decisions"][0]["allowed"], true);
    assert_eq!(json["decisions"][1]["allowed"], false);
}

#[tokio::test]
async fn test_audit_lists_decisions() {
    let (app, state) = setup_with_state();

    for (principal, owner) in [("42", "42"), ("7", "42"), ("42", "42")] {
        app.clone()
            .oneshot(post_json("/authorize", view_order_request(principal, owner)))
            .await
            .unwrap();
    }
    wait_for_audit(&state, 3).await;

    let response = app
        .clone()
        .oneshot(get("/audit?allowed=false"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let denials = body_json(response).await;
    assert_eq!(denials.as_array().unwrap().len(), 1);
    assert_eq!(denials[0]["principal_id"], "7");

    let response = app
        .oneshot(get("/audit?principal_id=42&limit=1"))
        .await
        .unwrap();
    let page = body_json(response).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
    assert_eq!(page[0]["allowed"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    app.clone()
        .oneshot(post_json("/authorize", view_order_request("42", "42")))
        .await
        .unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("policy_decisions_total"));
}
