//! Server-push event route
//!
//! Long-lived `text/event-stream` connection announcing gate
//! transitions. One `streamstart` record is pushed per Idle -> Armed
//! transition; the channel is advisory and a client must still re-check
//! authorization against `/stream`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::sse::{Event, Sse},
    response::IntoResponse,
};
use motion_gate::GateEvent;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::AppState;

/// Handle `GET /events`.
pub async fn get_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.monitor.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|received| match received {
        Ok(GateEvent::StreamStart) => Some(Ok::<Event, Infallible>(
            Event::default().event("streamstart").data("Stream started"),
        )),
        // A lagged receiver missed old transitions; only current state
        // matters, so skip and keep listening
        Err(_) => None,
    });

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Sse::new(stream),
    )
}
