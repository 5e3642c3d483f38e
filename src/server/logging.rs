use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

const LOG_TARGET: &str = "andar_bahar::server::http";

/// Middleware that logs incoming HTTP requests and their responses.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    tracing::debug!(
        target: LOG_TARGET,
        %method,
        %path,
        "incoming request"
    );

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        target: LOG_TARGET,
        %method,
        %path,
        status = %response.status().as_u16(),
        duration_ms = %duration.as_millis(),
        "request completed"
    );

    response
}
