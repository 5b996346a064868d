//! Per-request access logging.

use std::time::Instant;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Log method, host, status and latency of every request, and record request metrics.
pub async fn log_request(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(req).await;
    let status = response.status().as_u16();

    tracing::info!(
        method = %method,
        host = %host,
        status,
        time_ns = start.elapsed().as_nanos() as u64,
        "Request"
    );
    metrics::record_request(method.as_str(), status, start);

    response
}
