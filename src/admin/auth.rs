use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::lifecycle::ServerContext;

/// Requires `Authorization: Bearer <admin.api_key>`. An empty key locks the API.
pub async fn admin_auth_middleware(
    State(ctx): State<Arc<ServerContext>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let config = ctx.config();
    let expected = config.admin.api_key.as_str();
    if expected.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
