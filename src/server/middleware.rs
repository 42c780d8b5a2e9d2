use crate::server::response::{failure, Meta, RequestId};
use crate::server::state::AppState;
use crate::utils::error::AppError;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use rand::distr::{Alphanumeric, SampleString};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const CSP_NONCE_HEADER: &str = "x-csp-nonce";
const MAX_REQUEST_ID_LEN: usize = 64;

/// Nonce for inline scripts/styles on the current response.
#[derive(Debug, Clone)]
pub struct CspNonce(pub String);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn valid_request_id(value: &str) -> bool {
    value.len() <= MAX_REQUEST_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn new_request_id() -> String {
    format!("req-{}", Alphanumeric.sample_string(&mut rand::rng(), 16))
}

/// First `x-forwarded-for` hop, then `x-real-ip`, then a shared bucket.
pub fn client_key(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .unwrap_or("anonymous")
        .to_string()
}

/// Assigns the request id and wraps the request in an `http.request` span.
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let request_id = header_str(req.headers(), REQUEST_ID_HEADER)
        .filter(|v| valid_request_id(v))
        .map(str::to_string)
        .unwrap_or_else(new_request_id);
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let method = req.method().clone();
    let route = req.uri().path().to_string();
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route
    );

    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "{} {}",
            method,
            route
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn content_security_policy(nonce: &str, frame_ancestors: &str) -> String {
    format!(
        "default-src 'self'; script-src 'self' 'nonce-{nonce}'; style-src 'self' 'nonce-{nonce}'; \
         img-src 'self' data: https:; connect-src 'self'; font-src 'self'; object-src 'none'; \
         base-uri 'self'; form-action 'self'; frame-ancestors {frame_ancestors}"
    )
}

pub async fn security_headers(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let nonce = Alphanumeric.sample_string(&mut rand::rng(), 24);
    req.extensions_mut().insert(CspNonce(nonce.clone()));

    let mut response = next.run(req).await;
    let security = &state.config.security;
    let headers = response.headers_mut();

    let mut set = |name: &'static str, value: String| {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    };
    set(
        "content-security-policy",
        content_security_policy(&nonce, &security.frame_ancestors),
    );
    set(CSP_NONCE_HEADER, nonce);
    set("x-content-type-options", "nosniff".to_string());
    set("x-frame-options", "DENY".to_string());
    set("referrer-policy", "strict-origin-when-cross-origin".to_string());
    set(
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(), payment=()".to_string(),
    );
    if security.hsts {
        set(
            "strict-transport-security",
            format!("max-age={}; includeSubDomains", security.hsts_max_age_secs),
        );
    }
    response
}

pub async fn uri_limit(State(state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    let length = req.uri().to_string().len();
    let max = state.config.server.max_uri_bytes;
    if length > max {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(new_request_id()));
        let err = AppError::validation("uri", format!("request URI is {} bytes, limit is {}", length, max));
        return failure(&err, Meta::new(&request_id));
    }
    next.run(req).await
}

/// Token bucket per client on `/api/*`. Health checks are exempt.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path();
    if !state.config.rate_limit.enabled || !path.starts_with("/api/") || path == "/api/health" {
        return next.run(req).await;
    }

    let key = client_key(req.headers());
    if let Err(retry_after_secs) = state.rate_limiter.check(&key).await {
        tracing::warn!("🚦 Rate limited client {} on {}", key, path);
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(new_request_id()));
        return failure(&AppError::RateLimited { retry_after_secs }, Meta::new(&request_id));
    }
    next.run(req).await
}
