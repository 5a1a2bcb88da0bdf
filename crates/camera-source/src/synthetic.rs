//! Synthetic test-pattern camera

use std::time::Instant;

use bytes::Bytes;
use image::{GrayImage, ImageBuffer};
use tracing::info;

use crate::{CameraConfig, CameraError, Frame, FrameSource};

/// Frame source that renders a moving grayscale gradient and encodes it
/// as JPEG. Stands in for the hardware driver during development and in
/// tests; the gradient shifts with the sequence number so consecutive
/// frames differ.
pub struct SyntheticCamera {
    config: CameraConfig,
    epoch: Instant,
    sequence: u64,
}

impl SyntheticCamera {
    /// Initialize the source. Fails on a config the hardware could not
    /// accept, mirroring fatal camera init.
    pub fn open(config: CameraConfig) -> Result<Self, CameraError> {
        if config.width == 0 || config.height == 0 {
            return Err(CameraError::Init(format!(
                "invalid frame size {}x{}",
                config.width, config.height
            )));
        }
        if config.jpeg_quality == 0 || config.jpeg_quality > 100 {
            return Err(CameraError::Init(format!(
                "jpeg quality {} out of range 1-100",
                config.jpeg_quality
            )));
        }
        if config.fb_count == 0 {
            return Err(CameraError::Init("frame buffer count is zero".to_string()));
        }

        info!(
            "synthetic camera ready: {}x{} q{}",
            config.width, config.height, config.jpeg_quality
        );
        Ok(Self {
            config,
            epoch: Instant::now(),
            sequence: 0,
        })
    }

    fn render(&self) -> Vec<u8> {
        let (w, h) = (self.config.width, self.config.height);
        let shift = (self.sequence % 256) as u32;
        let mut data = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push(((x + y + shift) % 256) as u8);
            }
        }
        data
    }
}

impl FrameSource for SyntheticCamera {
    fn capture(&mut self) -> Result<Frame, CameraError> {
        let raw = self.render();
        let img: GrayImage =
            ImageBuffer::from_raw(self.config.width, self.config.height, raw)
                .ok_or_else(|| CameraError::Capture("pattern buffer mismatch".to_string()))?;

        let mut jpeg = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut jpeg,
            self.config.jpeg_quality,
        );
        encoder
            .encode_image(&img)
            .map_err(|e| CameraError::Encode(e.to_string()))?;

        let frame = Frame {
            data: Bytes::from(jpeg),
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
            sequence: self.sequence,
        };
        self.sequence += 1;
        Ok(frame)
    }
}
