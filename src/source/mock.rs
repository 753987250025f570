//! Mock capture source for testing without hardware.

use std::collections::VecDeque;

use crate::source::CaptureSource;
use crate::{CaptureBuffer, RecordError};

/// A scripted capture source that yields pre-loaded buffers.
///
/// Each queued buffer is returned by one `try_read` call, in push order,
/// making end-to-end pipeline tests deterministic without audio
/// hardware.
///
/// # Example
///
/// ```
/// use record_audio::{MockSource, CaptureSource};
///
/// let mut source = MockSource::new(16000, 1);
/// source.push_buffer(vec![1, 2, 3, 4]);
///
/// let buffer = source.try_read().unwrap().unwrap();
/// assert_eq!(*buffer.bytes, vec![1, 2, 3, 4]);
/// assert!(source.try_read().unwrap().is_none());
/// ```
pub struct MockSource {
    queue: VecDeque<Vec<u8>>,
    sample_rate: u32,
    channels: u16,
    fail_when_empty: bool,
}

impl MockSource {
    /// Creates an empty mock source with the given format.
    #[must_use]
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            queue: VecDeque::new(),
            sample_rate,
            channels,
            fail_when_empty: false,
        }
    }

    /// Queues one capture buffer of raw PCM bytes.
    pub fn push_buffer(&mut self, bytes: Vec<u8>) {
        self.queue.push_back(bytes);
    }

    /// Queues `len` bytes of silence.
    pub fn push_silence(&mut self, len: usize) {
        self.queue.push_back(vec![0u8; len]);
    }

    /// Makes `try_read` report a device failure once the queue drains,
    /// for exercising the capture error path.
    #[must_use]
    pub fn fail_when_empty(mut self) -> Self {
        self.fail_when_empty = true;
        self
    }

    /// Number of buffers still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl CaptureSource for MockSource {
    fn try_read(&mut self) -> Result<Option<CaptureBuffer>, RecordError> {
        match self.queue.pop_front() {
            Some(bytes) => Ok(Some(CaptureBuffer::new(
                bytes,
                self.sample_rate,
                self.channels,
            ))),
            None if self.fail_when_empty => {
                Err(RecordError::Backend("mock device read failure".to_string()))
            }
            None => Ok(None),
        }
    }
}
