use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_LENGTH, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::middleware::request_id::RequestId;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 1024;

/// Logs every 4xx/5xx response with its error code and a body preview.
/// The body is buffered and forwarded unchanged.
pub async fn log_error_responses(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let latency_ms = start.elapsed().as_millis() as u64;

    let (mut parts, body) = response.into_parts();
    let (body, entry) = match to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
        Ok(bytes) => {
            let entry = ErrorEntry::from_body(&bytes);
            (Body::from(bytes), entry)
        }
        Err(err) => {
            parts.headers.remove(CONTENT_LENGTH);
            tracing::warn!(error = ?err, "Failed to buffer error response body");
            (Body::empty(), ErrorEntry::default())
        }
    };

    if status.is_server_error() {
        tracing::error!(
            status = status.as_u16(),
            %method,
            path,
            request_id,
            latency_ms,
            code = entry.code,
            body = entry.preview,
            "Request failed"
        );
    } else if status != StatusCode::NOT_FOUND {
        tracing::warn!(
            status = status.as_u16(),
            %method,
            path,
            request_id,
            latency_ms,
            code = entry.code,
            body = entry.preview,
            "Request rejected"
        );
    } else {
        tracing::debug!(status = status.as_u16(), %method, path, request_id, "Not found");
    }

    Response::from_parts(parts, body)
}

#[derive(Debug, Default, PartialEq)]
struct ErrorEntry {
    code: String,
    preview: String,
}

impl ErrorEntry {
    /// Pulls the `code` field out of `{error, code, details?}` bodies.
    fn from_body(bytes: &Bytes) -> Self {
        let code = serde_json::from_slice::<serde_json::Value>(bytes)
            .ok()
            .and_then(|json| json.get("code").and_then(|c| c.as_str()).map(str::to_string))
            .unwrap_or_default();
        let preview = if bytes.len() > MAX_LOGGED_BODY_BYTES {
            format!(
                "{}... ({} bytes)",
                String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
                bytes.len()
            )
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        };
        Self { code, preview }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_is_extracted_from_json_bodies() {
        let body = Bytes::from_static(br#"{"error":"nope","code":"CONFLICT"}"#);
        let entry = ErrorEntry::from_body(&body);
        assert_eq!(entry.code, "CONFLICT");
        assert!(entry.preview.contains("nope"));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = Bytes::from(vec![b'x'; MAX_LOGGED_BODY_BYTES + 10]);
        let entry = ErrorEntry::from_body(&body);
        assert_eq!(entry.code, "");
        assert!(entry.preview.ends_with(&format!("({} bytes)", MAX_LOGGED_BODY_BYTES + 10)));
    }
}
