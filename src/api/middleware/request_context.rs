use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Span, info};
use uuid::Uuid;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Tags each request with an `x-request-id` (client supplied or generated),
/// echoes it back, and records one completion event per request. The id is also
/// recorded on the enclosing `http_request` span, which is created before it exists.
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get(&REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(|v| v.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let header_value = HeaderValue::from_str(&request_id).ok();
    Span::current().record("request_id", request_id.as_str());

    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID.clone(), value.clone());
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID.clone(), value);
    }

    info!(
        target: "metrics",
        method = %method,
        uri = %path,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        request_id = %request_id,
        "request_completed"
    );

    response
}
