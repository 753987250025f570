//! Error types for record-audio.
//!
//! Errors are split into two categories:
//! - **Setup/control errors** ([`RecordError`]): prevent a session (or a
//!   capture source) from starting
//! - **Pipeline errors** ([`EncodeError`]): runtime faults inside an
//!   encode pipeline, surfaced to listeners via
//!   [`RecordEvent::Error`](crate::RecordEvent::Error)

use std::path::PathBuf;

use crate::RecordFormat;

/// Errors that prevent recording from starting or a device from opening.
///
/// Control calls on [`RecordSession`](crate::RecordSession) never return
/// these directly; they are logged and converted to
/// [`RecordEvent::Error`](crate::RecordEvent::Error) notifications so a
/// recording failure can never crash the caller.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// No probed sample rate yielded a valid capture buffer size.
    #[error("no supported capture rate (probed {probed:?})")]
    NoSupportedRate {
        /// Sample rates that were probed, in order.
        probed: Vec<u32>,
    },

    /// The session was asked to record a format with no encoder configured.
    #[error("no {format} encoder configured")]
    EncoderUnavailable {
        /// The format that has no encoder factory.
        format: RecordFormat,
    },

    /// The configured sample rate has no ADTS sampling-frequency index.
    #[error("sample rate {rate}Hz has no ADTS frequency index")]
    UnsupportedAdtsRate {
        /// The unsupported rate.
        rate: u32,
    },

    /// No default input device is configured on this system.
    #[error("no default input device configured")]
    NoDefaultDevice,

    /// The device captures in a sample format this crate cannot convert.
    #[error("unsupported sample format: {format}")]
    UnsupportedSampleFormat {
        /// The format that wasn't supported.
        format: String,
    },

    /// An error from the underlying audio backend (CPAL).
    #[error("audio backend error: {0}")]
    Backend(String),

    /// File or directory creation failed during session setup.
    #[error("file error: {path}: {source}")]
    File {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RecordError {
    /// Creates a file error for the given path.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

/// Runtime faults inside an encode pipeline.
///
/// These never propagate as panics; the pipeline that hit the fault
/// tears itself down and the session reports the reason through an
/// error event.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The codec resource reported a failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// File I/O failed while writing encoded or raw audio.
    #[error("file error: {path}: {source}")]
    File {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// PCM segment merging failed. Reported distinctly from capture
    /// failures; the result file may be truncated.
    #[error("merge failed: {path}: {source}")]
    Merge {
        /// The file being read or written when the merge failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A pipeline worker exited and its queue is closed.
    #[error("encode queue closed")]
    QueueClosed,

    /// A blocking task failed to complete.
    #[error("task failed: {0}")]
    Task(String),
}

impl EncodeError {
    /// Creates a codec error with the given message.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Creates a file error for the given path.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Creates a merge error for the given path.
    pub fn merge(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Merge {
            path: path.into(),
            source,
        }
    }
}
