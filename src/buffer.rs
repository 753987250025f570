//! Captured audio buffer with metadata.

use std::sync::Arc;

/// One capture read's worth of raw PCM bytes.
///
/// `CaptureBuffer` is the unit of data flowing from the capture loop into
/// the active encode pipeline. The byte payload is `Arc`-wrapped so the
/// copy handed to data-event listeners shares storage with the copy the
/// pipeline encodes.
///
/// The vector length is the valid byte count; a short final read simply
/// yields a short buffer.
///
/// # Example
///
/// ```
/// use record_audio::CaptureBuffer;
///
/// let buffer = CaptureBuffer::new(vec![0x34, 0x12, 0x78, 0x56], 16000, 1);
/// assert_eq!(buffer.len(), 4);
/// assert_eq!(buffer.samples(), vec![0x1234, 0x5678]);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    /// PCM bytes, little-endian samples. Wrapped in `Arc` for zero-copy
    /// sharing between the pipeline and event listeners.
    pub bytes: Arc<Vec<u8>>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    pub channels: u16,
}

impl CaptureBuffer {
    /// Creates a new buffer from raw PCM bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>, sample_rate: u32, channels: u16) -> Self {
        Self {
            bytes: Arc::new(bytes),
            sample_rate,
            channels,
        }
    }

    /// Returns the valid byte count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if this buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the bytes as little-endian 16-bit samples.
    ///
    /// A trailing odd byte (possible only on a truncated device read) is
    /// dropped.
    #[must_use]
    pub fn samples(&self) -> Vec<i16> {
        self.bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }
}
