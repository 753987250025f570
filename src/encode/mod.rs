//! Per-format encode pipelines and codec ports.
//!
//! A pipeline consumes [`CaptureBuffer`]s from the capture task and
//! produces the final artifact:
//!
//! - **PCM/WAV**: the capture task's buffers are appended to temporary
//!   segment files; finalize merges them (and, for WAV, prepends the
//!   header). No worker threads.
//! - **MP3**: one blocking worker owns the [`Mp3Encoder`] and the result
//!   file, consuming a FIFO of sample chunks.
//! - **AAC**: two blocking workers - one feeds and drains the
//!   [`AacEncoder`] and ADTS-frames its output, one appends framed bytes
//!   to the result file.
//!
//! Stop is always a sentinel through the FIFO, never interruption, so
//! in-flight audio is encoded to completion before files close.

mod aac;
pub mod adts;
pub mod merge;
pub mod mock;
mod mp3;
mod pcm;
pub mod wav;

pub(crate) use aac::AacPipeline;
pub(crate) use mp3::Mp3Pipeline;
pub(crate) use pcm::SegmentPipeline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{CaptureBuffer, EncodeError, RecordConfig, RecordError};

/// Software MP3 encoder port.
///
/// Implementations are supplied to the session via
/// [`RecordSessionBuilder::mp3_encoder()`] and owned by the MP3
/// pipeline's worker; the encoder is dropped exactly once, when the
/// worker exits.
///
/// [`RecordSessionBuilder::mp3_encoder()`]: crate::RecordSessionBuilder::mp3_encoder
pub trait Mp3Encoder: Send {
    /// Encodes one chunk of 16-bit samples, returning the bytes produced.
    ///
    /// An encoder may buffer internally and return an empty vector.
    ///
    /// # Errors
    ///
    /// A codec failure ends the recording with an error event.
    fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>, EncodeError>;

    /// Flushes the encoder's tail bytes at end of stream.
    ///
    /// # Errors
    ///
    /// A codec failure ends the recording with an error event.
    fn finish(&mut self) -> Result<Vec<u8>, EncodeError>;
}

/// AAC codec port (hardware or software).
///
/// Models a codec with separate input and output ports: the encode
/// worker feeds PCM in, then drains access units until none is
/// immediately available.
pub trait AacEncoder: Send {
    /// Feeds one buffer of raw PCM bytes into the codec's input port.
    ///
    /// # Errors
    ///
    /// A codec failure ends the recording with an error event.
    fn feed(&mut self, pcm: &[u8]) -> Result<(), EncodeError>;

    /// Pops the next encoded access unit, or `None` if no output is
    /// immediately available.
    ///
    /// # Errors
    ///
    /// A codec failure ends the recording with an error event.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, EncodeError>;

    /// Flushes the codec at end of stream, returning any remaining
    /// access units.
    ///
    /// # Errors
    ///
    /// A codec failure ends the recording with an error event.
    fn finish(&mut self) -> Result<Vec<Vec<u8>>, EncodeError>;
}

/// Factory producing an MP3 encoder for a session's config.
pub type Mp3EncoderFactory =
    Arc<dyn Fn(&RecordConfig) -> Result<Box<dyn Mp3Encoder>, RecordError> + Send + Sync>;

/// Factory producing an AAC encoder for a session's config.
pub type AacEncoderFactory =
    Arc<dyn Fn(&RecordConfig) -> Result<Box<dyn AacEncoder>, RecordError> + Send + Sync>;

/// The active pipeline for one recording, selected by format at start.
pub(crate) enum EncodePipeline {
    /// PCM and WAV both record through segment files.
    Segment(SegmentPipeline),
    Mp3(Mp3Pipeline),
    Aac(AacPipeline),
}

impl EncodePipeline {
    /// Consumes one capture buffer.
    pub(crate) async fn feed(&mut self, buffer: &CaptureBuffer) -> Result<(), EncodeError> {
        match self {
            Self::Segment(p) => p.append(Arc::clone(&buffer.bytes)).await,
            Self::Mp3(p) => p.feed(buffer.samples()),
            Self::Aac(p) => p.feed(Arc::clone(&buffer.bytes)),
        }
    }

    /// Closes the current segment at a pause/stop boundary. MP3/AAC
    /// workers stay alive across pause.
    pub(crate) async fn suspend(&mut self) -> Result<(), EncodeError> {
        match self {
            Self::Segment(p) => p.close_segment().await,
            Self::Mp3(_) | Self::Aac(_) => Ok(()),
        }
    }

    /// Opens a new segment on resume. No-op for MP3/AAC, which stream to
    /// the result file continuously.
    pub(crate) async fn resume_segment(&mut self, segment: PathBuf) -> Result<(), EncodeError> {
        match self {
            Self::Segment(p) => p.open_segment(segment).await,
            Self::Mp3(_) | Self::Aac(_) => Ok(()),
        }
    }

    /// Produces the final artifact: merge/header for PCM/WAV, full
    /// worker drain for MP3/AAC. All bytes are flushed when this returns.
    pub(crate) async fn finalize(
        self,
        result: &Path,
        config: &RecordConfig,
    ) -> Result<(), EncodeError> {
        match self {
            Self::Segment(p) => p.finalize(result, config).await,
            Self::Mp3(p) => p.finalize().await,
            Self::Aac(p) => p.finalize().await,
        }
    }

    /// Failure-path teardown: drain workers and close files without
    /// producing a completion notification. Segment files are left on
    /// disk unmerged.
    pub(crate) async fn shutdown(self) {
        match self {
            Self::Segment(p) => p.shutdown().await,
            Self::Mp3(p) => {
                if let Err(e) = p.finalize().await {
                    tracing::warn!("mp3 pipeline teardown: {e}");
                }
            }
            Self::Aac(p) => {
                if let Err(e) = p.finalize().await {
                    tracing::warn!("aac pipeline teardown: {e}");
                }
            }
        }
    }
}
