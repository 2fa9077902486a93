//! Streaming HTTP transport: the MCP service at `/mcp`, a health probe
//! with rate-limit statistics, and the per-IP token-bucket middleware.

use crate::rate_limit::{RateDecision, RateLimiter};
use crate::server::{ServerState, WhodbMcpServer};
use axum::Json;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

pub const BYPASS_HEADER: &str = "X-RateLimit-Bypass";

/// Builds the HTTP router. The rate limiter wraps only the MCP endpoint;
/// `/health` stays reachable for probes even when a caller is limited.
pub fn router(state: Arc<ServerState>, limiter: Arc<RateLimiter>) -> axum::Router {
    let mcp_service = StreamableHttpService::new(
        move || Ok(WhodbMcpServer::new(state.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    axum::Router::new()
        .nest_service("/mcp", mcp_service)
        .layer(middleware::from_fn_with_state(
            limiter.clone(),
            rate_limit_middleware,
        ))
        .route("/health", get(health))
        .with_state(limiter)
}

async fn health(State(limiter): State<Arc<RateLimiter>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "rateLimit": limiter.stats(),
    }))
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let bypass = request
        .headers()
        .get(BYPASS_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match limiter.check(addr.ip(), bypass.as_deref()) {
        RateDecision::Allowed { limit, remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
                headers.insert("X-RateLimit-Limit", value);
            }
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                headers.insert("X-RateLimit-Remaining", value);
            }
            response
        }
        RateDecision::Limited { retry_after_secs } => {
            log::warn!("[HTTP] rate limited {addr}");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "rate limit exceeded",
                    "retryAfter": retry_after_secs,
                })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
