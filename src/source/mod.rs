//! Capture sources and buffer size negotiation.
//!
//! A [`CaptureSource`] is the boundary to the physical capture device: it
//! yields fixed-size buffers of raw PCM when polled and releases the
//! device when dropped. The crate ships a CPAL-backed implementation
//! ([`CpalSource`]) and a scriptable [`MockSource`] for testing without
//! hardware.

mod device;
mod mock;
mod negotiate;

pub use device::CpalSource;
pub use mock::MockSource;
pub use negotiate::{negotiate, NegotiatedBuffer, CANDIDATE_RATES};

use std::sync::Arc;

use crate::{CaptureBuffer, RecordConfig, RecordError};

/// A handle to an active capture device.
///
/// One source exists per recording segment: the session constructs a
/// fresh source at `start` and at every `resume`, and drops it when the
/// capture loop exits (pause, stop, or failure). Dropping the source
/// stops capture and releases the device.
pub trait CaptureSource: Send {
    /// Non-blocking read of the next capture buffer.
    ///
    /// Returns `Ok(None)` when no full buffer has accumulated yet. The
    /// capture loop polls this on an interval and drains everything
    /// available each tick.
    ///
    /// # Errors
    ///
    /// A device read failure ends the recording segment; the session
    /// reports it as a capture error.
    fn try_read(&mut self) -> Result<Option<CaptureBuffer>, RecordError>;
}

/// Factory invoked at `start` and `resume` to open a capture source.
///
/// The default factory opens the system's default input device via
/// [`CpalSource::open`].
pub type SourceFactory =
    Arc<dyn Fn(&RecordConfig) -> Result<Box<dyn CaptureSource>, RecordError> + Send + Sync>;
