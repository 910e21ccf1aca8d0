use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::StreamParams;
use crate::service::relay_service::RelayService;

/// Synthetic control line sent before any upstream byte. It pushes the
/// browser's automatic-reconnect interval so high that a dropped stream is
/// never silently re-opened behind the client's back.
const RETRY_GUARD: &[u8] = b"retry: 100000000\n\n";

/// GET `/api/chat?q=...&cid=...` — relays the upstream SSE stream verbatim.
///
/// Everything that fails before the first streamed byte is reported as a
/// plain HTTP error; once streaming has begun the stream itself always ends
/// with either the upstream's own terminal event or a synthetic `error`
/// event, so the client is never left waiting on a dead connection.
pub async fn chat_stream_handler(
    State(svc): State<RelayService>,
    Query(params): Query<StreamParams>,
) -> Response {
    let query = params.q.as_deref().unwrap_or("").trim();

    let upstream = match svc.open_stream(query, params.cid.as_deref()).await {
        Ok(upstream) => upstream,
        Err(err) => return error_response(&err),
    };

    debug!("Upstream accepted streaming request, relaying");

    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(16);
    tokio::spawn(pump_upstream(upstream, tx));

    let mut response = Response::new(Body::from_stream(ReceiverStream::new(rx)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// Copies the upstream body to the client chunk for chunk. No parsing, no
/// buffering: one guard line up front, then a dumb pipe. A transport failure
/// mid-stream becomes a single synthetic `error` event before close.
async fn pump_upstream(upstream: reqwest::Response, tx: mpsc::Sender<Result<Bytes, Infallible>>) {
    if tx.send(Ok(Bytes::from_static(RETRY_GUARD))).await.is_err() {
        return;
    }

    let mut chunks = upstream.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(bytes) => {
                // A failed send means the client hung up; stop reading.
                if tx.send(Ok(bytes)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Upstream stream failed mid-flight: {e}");
                let _ = tx.send(Ok(Bytes::from(error_event(&e.to_string())))).await;
                return;
            }
        }
    }
}

/// Formats the synthetic terminal SSE event for a mid-stream failure.
fn error_event(detail: &str) -> String {
    let payload = serde_json::json!({ "error": detail });
    format!("event: error\ndata: {payload}\n\n")
}

fn error_response(err: &AppError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_configuration() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, err.to_string()).into_response()
}
