//! MotionCam HTTP Surface
//!
//! Serves the control page, the multipart JPEG stream, and the
//! server-push event channel. Session handlers share nothing mutable:
//! they read the gate through an atomic snapshot and take the camera
//! mutex only for the duration of a single capture.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod routes;
pub mod settings;

use camera_source::FrameSource;
use motion_gate::GateMonitor;
use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Read-only gate handle
    pub monitor: GateMonitor,
    /// Exclusive camera access; one in-flight capture at a time
    pub camera: Mutex<Box<dyn FrameSource>>,
    /// Delay between stream parts
    pub frame_interval: Duration,
    /// False selects the ungated variant: streaming always permitted
    pub gate_enabled: bool,
}

impl AppState {
    /// Create new application state
    pub fn new(monitor: GateMonitor, camera: Box<dyn FrameSource>, settings: &Settings) -> Self {
        Self {
            monitor,
            camera: Mutex::new(camera),
            frame_interval: settings.frame_interval(),
            gate_enabled: settings.gate.enabled,
        }
    }

    /// Whether a stream session may run right now.
    pub fn authorized(&self) -> bool {
        !self.gate_enabled || self.monitor.is_authorized()
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/stream", get(routes::stream::get_stream))
        .route("/events", get(routes::events::get_events))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Static control page
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404: Not found")
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting camera server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
