//! HTTP surface tests
//!
//! Exercise the router end to end with an in-process service: rejection
//! while idle, multipart framing while armed, mid-stream de-authorization,
//! the server-push event channel, and the fallback paths.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use tokio::time::timeout;
use tower::ServiceExt;

use api::settings::Settings;
use api::{create_router, AppState};
use camera_source::{CameraConfig, CameraError, Frame, FrameSource, SyntheticCamera};
use motion_gate::{GateConfig, MotionGate};

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    // Fast cadence keeps the streaming tests short
    settings.stream.fps = 100;
    settings
}

fn state_for(gate: &MotionGate) -> Arc<AppState> {
    let camera = SyntheticCamera::open(CameraConfig {
        width: 64,
        height: 48,
        ..Default::default()
    })
    .expect("synthetic camera");
    Arc::new(AppState::new(
        gate.monitor(),
        Box::new(camera),
        &test_settings(),
    ))
}

fn armed_gate() -> (MotionGate, Instant) {
    let mut gate = MotionGate::new(GateConfig::default());
    let t0 = Instant::now();
    gate.latch().record_edge_at(t0);
    gate.tick(t0);
    (gate, t0)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Read the next body chunk, or None once the stream has ended.
async fn next_chunk(body: &mut Body) -> Option<Bytes> {
    match timeout(Duration::from_secs(2), body.frame()).await {
        Ok(Some(Ok(frame))) => frame.into_data().ok(),
        _ => None,
    }
}

/// Validate one multipart segment and return its JPEG payload.
fn parse_part(part: &Bytes) -> Bytes {
    let prefix: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: ";
    assert!(
        part.starts_with(prefix),
        "part does not start with boundary and headers"
    );

    let rest = &part[prefix.len()..];
    let header_end = rest
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("part header terminator");
    let len: usize = std::str::from_utf8(&rest[..header_end])
        .unwrap()
        .parse()
        .unwrap();

    let payload = &rest[header_end + 4..];
    assert_eq!(payload.len(), len + 2, "Content-Length must match payload");
    assert_eq!(&payload[len..], b"\r\n");
    part.slice(prefix.len() + header_end + 4..prefix.len() + header_end + 4 + len)
}

#[tokio::test]
async fn test_root_serves_control_page() {
    let gate = MotionGate::new(GateConfig::default());
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let page = std::str::from_utf8(&body).unwrap();
    assert!(page.contains("<html"));
    assert!(page.contains("/stream"));
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let gate = MotionGate::new(GateConfig::default());
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"404: Not found");
}

#[tokio::test]
async fn test_stream_rejected_while_idle() {
    let gate = MotionGate::new(GateConfig::default());
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/stream")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Streaming not allowed");
}

#[tokio::test]
async fn test_stream_emits_wellformed_parts_while_armed() {
    let (gate, _) = armed_gate();
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/stream")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut body = resp.into_body();
    for _ in 0..3 {
        let part = next_chunk(&mut body).await.expect("stream part");
        let payload = parse_part(&part);
        // JPEG magic bytes
        assert_eq!(&payload[0..2], &[0xFF, 0xD8]);
    }
}

#[tokio::test]
async fn test_stream_ends_after_disarm() {
    let (mut gate, t0) = armed_gate();
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/stream")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut body = resp.into_body();
    let part = next_chunk(&mut body).await.expect("first part");
    parse_part(&part);

    // Decay past the inactivity window
    gate.tick(t0 + Duration::from_secs(6));
    assert!(!gate.is_authorized());

    // At most the in-flight parts may still arrive, then the body ends
    let mut extras = 0;
    while let Some(part) = next_chunk(&mut body).await {
        parse_part(&part);
        extras += 1;
        assert!(extras <= 2, "session kept emitting after disarm");
    }
}

#[tokio::test]
async fn test_sequential_sessions_are_independent() {
    let (gate, _) = armed_gate();
    let app = create_router(state_for(&gate));

    let resp1 = app.clone().oneshot(get("/stream")).await.unwrap();
    assert_eq!(resp1.status(), StatusCode::OK);
    let mut body1 = resp1.into_body();
    parse_part(&next_chunk(&mut body1).await.expect("session 1 part"));

    let resp2 = app.clone().oneshot(get("/stream")).await.unwrap();
    assert_eq!(resp2.status(), StatusCode::OK);
    let mut body2 = resp2.into_body();
    parse_part(&next_chunk(&mut body2).await.expect("session 2 part"));

    // Closing the first session does not disturb the second
    drop(body1);
    parse_part(&next_chunk(&mut body2).await.expect("session 2 continues"));
}

#[tokio::test]
async fn test_ungated_variant_streams_while_idle() {
    let gate = MotionGate::new(GateConfig::default());
    let mut settings = test_settings();
    settings.gate.enabled = false;

    let camera = SyntheticCamera::open(CameraConfig::default()).unwrap();
    let state = Arc::new(AppState::new(gate.monitor(), Box::new(camera), &settings));
    let app = create_router(state);

    let resp = app.oneshot(get("/stream")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut body = resp.into_body();
    parse_part(&next_chunk(&mut body).await.expect("ungated part"));
}

/// Camera whose buffer pulls always fail.
struct FailingCamera;

impl FrameSource for FailingCamera {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        Err(CameraError::Capture("no buffer".to_string()))
    }
}

#[tokio::test]
async fn test_failed_pull_ends_session_without_parts() {
    let (gate, _) = armed_gate();
    let state = Arc::new(AppState::new(
        gate.monitor(),
        Box::new(FailingCamera),
        &test_settings(),
    ));
    let app = create_router(state);

    let resp = app.oneshot(get("/stream")).await.unwrap();
    // The pull failure ends only the session; the response itself was
    // already accepted
    assert_eq!(resp.status(), StatusCode::OK);

    let mut body = resp.into_body();
    assert!(next_chunk(&mut body).await.is_none());
}

#[tokio::test]
async fn test_events_pushes_streamstart_on_arming() {
    let mut gate = MotionGate::new(GateConfig::default());
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/events")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");

    // Arm after the client has attached
    let t0 = Instant::now();
    gate.latch().record_edge_at(t0);
    gate.tick(t0);

    let mut body = resp.into_body();
    let chunk = next_chunk(&mut body).await.expect("event record");
    assert_eq!(&chunk[..], b"event: streamstart\ndata: Stream started\n\n");
}

#[tokio::test]
async fn test_events_notifies_once_per_armed_interval() {
    let mut gate = MotionGate::new(GateConfig::default());
    let app = create_router(state_for(&gate));

    let resp = app.oneshot(get("/events")).await.unwrap();
    let mut body = resp.into_body();

    let t0 = Instant::now();
    gate.latch().record_edge_at(t0);
    gate.tick(t0);
    // Repeated motion while armed must not re-notify
    gate.latch().record_edge_at(t0 + Duration::from_secs(1));
    gate.tick(t0 + Duration::from_secs(1));

    let first = next_chunk(&mut body).await.expect("event record");
    assert_eq!(&first[..], b"event: streamstart\ndata: Stream started\n\n");

    // No second record shows up in a short poll window
    let second = timeout(Duration::from_millis(200), body.frame()).await;
    assert!(second.is_err(), "unexpected second event record");
}
