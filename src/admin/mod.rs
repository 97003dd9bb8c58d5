//! Admin HTTP API.
//!
//! # Responsibilities
//! - Expose safety mode, stats and the effective config for operators
//! - Trigger a reload without sending a signal
//!
//! # Design Decisions
//! - Bearer auth against `admin.api_key` from the *current* snapshot, so a
//!   reload can rotate the key
//! - Bound to localhost by default and disabled unless `admin.enabled`

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::lifecycle::ServerContext;

use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn admin_router(ctx: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/safety", get(get_safety))
        .route("/admin/safety/check/{tool}", get(check_tool))
        .route("/admin/stats", get(get_stats))
        .route("/admin/config", get(get_config))
        .route("/admin/reload", post(trigger_reload))
        .layer(middleware::from_fn_with_state(ctx.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Serve the admin API on `listener` until `shutdown` fires.
pub async fn serve(
    ctx: Arc<ServerContext>,
    listener: TcpListener,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }

    axum::serve(listener, admin_router(ctx))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
