//! Per-client rate limiting middleware.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::net::SocketAddr;

use crate::errors::ErrorResponse;
use crate::routes::AppState;

/// Reject requests from clients that have used up their window.
pub(crate) async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(request.headers(), peer, state.trust_forwarded_for);

    if state.rate_limiter.allow(&client).await {
        return next.run(request).await;
    }

    tracing::info!("Rate limit exceeded for client {}", client);
    let body = ErrorResponse {
        error: "Too many requests. Please try again later.".to_string(),
        kind: "rate_limited".to_string(),
    };
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&state.rate_limiter.window_secs().to_string()) {
        response.headers_mut().insert(RETRY_AFTER, value);
    }
    response
}

/// Identify the caller by peer IP.
///
/// With `trust_forwarded` set, the first `X-Forwarded-For` hop takes
/// precedence; the header is client-controlled otherwise.
pub(crate) fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded: bool,
) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .filter(|_| trust_forwarded)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}
