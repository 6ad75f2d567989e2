//! Request ID generation and request tracking middleware

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Response header carrying the request's correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a new request ID using UUID v4
///
/// Returns a unique correlation ID for one HTTP request.
///
/// # Examples
///
/// ```
/// use kiln::logging::generate_request_id;
///
/// let request_id = generate_request_id();
/// assert!(!request_id.is_empty());
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Tag each request with an ID, log its outcome and record HTTP metrics.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let request_id = generate_request_id();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let span = tracing::debug_span!("request", request_id = %request_id, method = %method, path = %path);
    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let elapsed = start.elapsed();

    metrics::counter!(
        "kiln_http_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("kiln_http_request_duration_seconds").record(elapsed.as_secs_f64());

    span.in_scope(|| {
        tracing::debug!(
            status,
            latency_ms = elapsed.as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_id_format() {
        let id = generate_request_id();
        // UUID v4 format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_generate_request_id_uniqueness() {
        let id1 = generate_request_id();
        let id2 = generate_request_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_request_id_parseable() {
        let id = generate_request_id();
        let parsed = Uuid::parse_str(&id);
        assert!(parsed.is_ok());
    }
}
