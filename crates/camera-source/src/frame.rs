//! Encoded frame type

use bytes::Bytes;

/// One encoded JPEG image pulled from the camera.
///
/// The frame owns its buffer; dropping it returns the memory, mirroring
/// the fetch/release discipline of the underlying driver. A frame must
/// not be retained beyond the emission cycle that pulled it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// JPEG-encoded image data
    pub data: Bytes,
    /// Capture timestamp (milliseconds since source init)
    pub timestamp_ms: u64,
    /// Frame sequence number
    pub sequence: u64,
}

impl Frame {
    /// Byte length of the encoded payload.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
