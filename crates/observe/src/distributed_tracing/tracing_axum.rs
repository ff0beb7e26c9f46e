use {
    axum::http::{HeaderValue, Request},
    tracing::{Span, field, info_span},
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Creates the span every incoming request gets handled in. The request id
/// header is recorded when the caller provided one so logs across services
/// can be tied together.
pub fn make_span<B>(request: &Request<B>) -> Span {
    let uri = request.uri();
    let method = request.method();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value: &HeaderValue| value.to_str().ok());

    let span = info_span!(
        "incoming request",
        ?uri,
        ?method,
        request_id = field::Empty
    );
    if let Some(request_id) = request_id {
        span.record("request_id", request_id);
    }
    span
}
