//! Deterministic mock encoders for testing without codec resources.

use std::collections::VecDeque;

use crate::encode::{AacEncoder, Mp3Encoder};
use crate::EncodeError;

/// A pass-through "MP3" encoder: samples come back out as little-endian
/// bytes, plus an optional fixed tail at finish.
///
/// Useful for asserting pipeline ordering and drain behavior without a
/// real codec.
pub struct MockMp3Encoder {
    tail: Vec<u8>,
    fail_on_encode: bool,
}

impl MockMp3Encoder {
    /// Creates a pass-through encoder with an empty tail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tail: Vec::new(),
            fail_on_encode: false,
        }
    }

    /// Sets the bytes returned by `finish`.
    #[must_use]
    pub fn with_tail(mut self, tail: Vec<u8>) -> Self {
        self.tail = tail;
        self
    }

    /// Makes every `encode` call fail, for exercising fault paths.
    #[must_use]
    pub fn fail_on_encode(mut self) -> Self {
        self.fail_on_encode = true;
        self
    }
}

impl Default for MockMp3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mp3Encoder for MockMp3Encoder {
    fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>, EncodeError> {
        if self.fail_on_encode {
            return Err(EncodeError::codec("mock encode failure"));
        }
        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(bytes)
    }

    fn finish(&mut self) -> Result<Vec<u8>, EncodeError> {
        Ok(std::mem::take(&mut self.tail))
    }
}

/// A mock AAC codec that slices its input into fixed-size access units.
///
/// Fed bytes accumulate in an input buffer; every `frame_len` bytes
/// become one "access unit" available from the output port. `finish`
/// flushes any shorter remainder as a final unit.
pub struct MockAacEncoder {
    frame_len: usize,
    pending: Vec<u8>,
    ready: VecDeque<Vec<u8>>,
    fail_on_feed: bool,
}

impl MockAacEncoder {
    /// Creates a codec producing one access unit per `frame_len` input
    /// bytes.
    #[must_use]
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len: frame_len.max(1),
            pending: Vec::new(),
            ready: VecDeque::new(),
            fail_on_feed: false,
        }
    }

    /// Makes every `feed` call fail, for exercising fault paths.
    #[must_use]
    pub fn fail_on_feed(mut self) -> Self {
        self.fail_on_feed = true;
        self
    }
}

impl AacEncoder for MockAacEncoder {
    fn feed(&mut self, pcm: &[u8]) -> Result<(), EncodeError> {
        if self.fail_on_feed {
            return Err(EncodeError::codec("mock feed failure"));
        }
        self.pending.extend_from_slice(pcm);
        while self.pending.len() >= self.frame_len {
            let unit: Vec<u8> = self.pending.drain(..self.frame_len).collect();
            self.ready.push_back(unit);
        }
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, EncodeError> {
        Ok(self.ready.pop_front())
    }

    fn finish(&mut self) -> Result<Vec<Vec<u8>>, EncodeError> {
        let mut units: Vec<Vec<u8>> = self.ready.drain(..).collect();
        if !self.pending.is_empty() {
            units.push(std::mem::take(&mut self.pending));
        }
        Ok(units)
    }
}
