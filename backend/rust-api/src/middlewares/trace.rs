use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Longest caller-supplied trace id we echo back; anything else gets a fresh one.
const MAX_TRACE_ID_LEN: usize = 128;

/// Request-scoped trace id, available to handlers as an extension.
#[derive(Clone, Debug)]
pub struct RequestTraceContext {
    pub trace_id: String,
}

fn incoming_trace_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_TRACE_ID_LEN)
        .map(str::to_string)
}

/// Runs the request inside a `request` span tagged with the trace id and
/// echoes the id on the response, so coaching logs can be tied to a caller.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = incoming_trace_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestTraceContext {
        trace_id: trace_id.clone(),
    });

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    }

    response
}
