//! Multipart JPEG stream route
//!
//! While the gate authorizes streaming, each connected client gets an
//! unbounded `multipart/x-mixed-replace` body: one JPEG part per frame
//! pull at the configured cadence. Sessions are independent; every
//! client pulls its own frames under the camera mutex.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use camera_source::Frame;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::AppState;

/// Boundary token separating stream parts
const BOUNDARY: &str = "frame";

/// Handle `GET /stream`.
pub async fn get_stream(State(state): State<Arc<AppState>>) -> Response {
    if !state.authorized() {
        return (StatusCode::FORBIDDEN, "Streaming not allowed").into_response();
    }

    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(1);
    tokio::spawn(emit_frames(state, tx));

    let body = Body::from_stream(ReceiverStream::new(rx));
    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={BOUNDARY}"),
        )
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .expect("Failed to build stream response")
}

/// Per-session emission loop. Each iteration re-checks authorization,
/// pulls one frame, writes one part, then sleeps for the frame interval.
/// Ends on de-authorization, client disconnect, or a failed pull.
async fn emit_frames(state: Arc<AppState>, tx: mpsc::Sender<Result<Bytes, Infallible>>) {
    let mut parts: u64 = 0;
    loop {
        if !state.authorized() {
            debug!("gate disarmed, ending stream session after {} parts", parts);
            break;
        }

        let pulled = {
            let mut camera = state.camera.lock().await;
            camera.capture()
        };
        let frame = match pulled {
            Ok(frame) => frame,
            Err(e) => {
                warn!("camera capture failed: {}", e);
                break;
            }
        };

        let part = encode_part(&frame);
        // The frame buffer is released here; only the part copy survives
        drop(frame);

        if tx.send(Ok(part)).await.is_err() {
            debug!("stream client disconnected after {} parts", parts);
            break;
        }
        parts += 1;

        tokio::time::sleep(state.frame_interval).await;
    }
}

/// Encode one frame as a multipart segment: boundary marker, part
/// headers, payload, trailing separator.
fn encode_part(frame: &Frame) -> Bytes {
    let head = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        frame.len()
    );

    let mut part = Vec::with_capacity(head.len() + frame.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(&frame.data);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}
