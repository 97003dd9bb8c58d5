//! Admin router tests driven in-process with `tower::ServiceExt::oneshot`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use kube_mcp_gate::admin::admin_router;
use kube_mcp_gate::lifecycle::ServerContext;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{kubernetes_registry, ConfigTree, Effects};

const KEY: &str = "test-admin-key";

fn setup(extra: &str) -> (ConfigTree, Arc<ServerContext>) {
    let tree = ConfigTree::new();
    tree.write_main(&format!(
        "[admin]\nenabled = true\napi_key = \"{KEY}\"\n\n[browser]\napi_key = \"bb-secret\"\n{extra}"
    ));
    let ctx = ServerContext::bootstrap(tree.loader(), None, kubernetes_registry(Arc::new(Effects::default()))).unwrap();
    (tree, ctx)
}

async fn send(router: Router, method: &str, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_requests_without_key_are_rejected() {
    let (_tree, ctx) = setup("");
    let router = admin_router(ctx);

    let (status, _) = send(router.clone(), "GET", "/admin/status", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(router, "GET", "/admin/status", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_key_locks_the_api() {
    let tree = ConfigTree::new();
    let ctx = ServerContext::bootstrap(tree.loader(), None, Default::default()).unwrap();

    let (status, _) = send(admin_router(ctx), "GET", "/admin/status", Some("")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_lists_tools() {
    let (_tree, ctx) = setup("");
    let (status, body) = send(admin_router(ctx), "GET", "/admin/status", Some(KEY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["safety_mode"], "normal");
    assert_eq!(body["transport"], "stdio");
    assert_eq!(body["tools"], json!(["delete_pod", "get_pods", "scale_deployment"]));
}

#[tokio::test]
async fn test_safety_and_check_endpoints() {
    let (_tree, ctx) = setup("\n[safety]\nmode = \"disable-destructive\"\n");
    let router = admin_router(ctx);

    let (_, safety) = send(router.clone(), "GET", "/admin/safety", Some(KEY)).await;
    assert_eq!(safety["mode"], "disable-destructive");
    let blocked = safety["blocked_operations"].as_array().unwrap();
    assert!(blocked.contains(&json!("delete_pod")));
    assert!(!blocked.contains(&json!("scale_deployment")));

    let (_, check) = send(router.clone(), "GET", "/admin/safety/check/delete_pod", Some(KEY)).await;
    assert_eq!(check["allowed"], false);
    assert!(check["reason"].as_str().unwrap().contains("destructive"));

    let (_, check) = send(router, "GET", "/admin/safety/check/scale_deployment", Some(KEY)).await;
    assert_eq!(check["allowed"], true);
    assert_eq!(check["reason"], "");
}

#[tokio::test]
async fn test_config_endpoint_redacts_secrets() {
    let (_tree, ctx) = setup("");
    let (status, body) = send(admin_router(ctx), "GET", "/admin/config", Some(KEY)).await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["browser"]["api_key"], "bb-secret");
    assert_ne!(body["admin"]["api_key"], KEY);
    assert_eq!(body["server"]["port"], 8000);
}

#[tokio::test]
async fn test_reload_endpoint_applies_new_mode() {
    let tree = ConfigTree::new();
    tree.write_main(&format!("[admin]\nenabled = true\napi_key = \"{KEY}\"\n"));
    let (source, failing) = tree.faulty_loader();
    let ctx = ServerContext::bootstrap(source, None, Default::default()).unwrap();
    let router = admin_router(ctx.clone());

    tree.write_dropin("90-lockdown.toml", "[safety]\nmode = \"read-only\"\n");
    let (status, body) = send(router.clone(), "POST", "/admin/reload", Some(KEY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reloaded"], true);
    assert_eq!(body["safety_mode"], "read-only");

    failing.store(true, Ordering::SeqCst);
    let (status, body) = send(router, "POST", "/admin/reload", Some(KEY)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["reloaded"], false);
    assert!(body["error"].as_str().unwrap().contains("permission denied"));
    assert_eq!(ctx.gate.mode().as_str(), "read-only");
}

#[tokio::test]
async fn test_stats_reflect_dispatched_calls() {
    let (_tree, ctx) = setup("\n[safety]\nmode = \"read-only\"\n");
    ctx.tools.call("get_pods", json!({})).await;
    ctx.tools.call("delete_pod", json!({})).await;

    let (_, stats) = send(admin_router(ctx), "GET", "/admin/stats", Some(KEY)).await;
    assert_eq!(stats["total_calls"], 1);
    assert_eq!(stats["blocked_calls"], 1);
    assert_eq!(stats["tools"]["delete_pod"]["blocked"], 1);
}
