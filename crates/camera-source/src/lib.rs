//! Camera Frame Source
//!
//! Abstraction over the camera peripheral that supplies encoded JPEG
//! frames on demand. The hardware driver itself is an external
//! collaborator; this crate defines the capture contract and ships a
//! synthetic implementation for development and tests.

mod frame;
mod synthetic;

pub use frame::Frame;
pub use synthetic::SyntheticCamera;

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera init failed: {0}")]
    Init(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Frame encoding failed: {0}")]
    Encode(String),

    #[error("Capture timeout")]
    Timeout,
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0"); None for the synthetic source
    pub device: Option<String>,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Number of driver-side frame buffers
    pub fb_count: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        // CIF-class capture, matching the low-latency defaults of the
        // target hardware
        Self {
            device: None,
            width: 400,
            height: 296,
            jpeg_quality: 75,
            fb_count: 1,
        }
    }
}

/// A source of encoded frames.
///
/// Capture is exclusive: only one in-flight capture may be outstanding,
/// so holders share a source behind a mutex. Each returned [`Frame`] is
/// fetch-once, use-once; dropping it releases the buffer.
pub trait FrameSource: Send {
    /// Pull one encoded frame from the camera.
    fn capture(&mut self) -> Result<Frame, CameraError>;
}
