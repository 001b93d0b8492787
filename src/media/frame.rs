//! Video frame data structures

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// An encoded video frame with metadata
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Encoded frame data
    data: Arc<Bytes>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Whether this is a key frame
    pub key_frame: bool,
    /// Frame sequence number
    pub sequence: u64,
    /// Timestamp when frame was captured
    pub capture_ts: Instant,
}

impl VideoFrame {
    /// Create a new video frame
    pub fn new(data: Bytes, width: u32, height: u32, key_frame: bool, sequence: u64) -> Self {
        Self {
            data: Arc::new(data),
            width,
            height,
            key_frame,
            sequence,
            capture_ts: Instant::now(),
        }
    }

    /// Create a frame from a Vec<u8>
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32, key_frame: bool, sequence: u64) -> Self {
        Self::new(Bytes::from(data), width, height, key_frame, sequence)
    }

    /// Get frame data as bytes slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get frame data as Bytes (cheap clone)
    pub fn data_bytes(&self) -> Bytes {
        (*self.data).clone()
    }

    /// Get data length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if frame is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get age of this frame (time since capture)
    pub fn age(&self) -> std::time::Duration {
        self.capture_ts.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_accessors() {
        let frame = VideoFrame::from_vec(vec![0u8; 512], 1280, 720, true, 7);
        assert_eq!(frame.len(), 512);
        assert!(!frame.is_empty());
        assert_eq!(frame.width, 1280);
        assert_eq!(frame.sequence, 7);
        assert_eq!(frame.data_bytes().len(), 512);
    }
}
