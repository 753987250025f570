//! # record-audio
//!
//! Microphone recording with pause/resume and multi-format output
//! (PCM / WAV / MP3 / AAC).
//!
//! `record-audio` owns the capture/encode pipeline: a state machine over
//! the recording lifecycle, a per-format encode pipeline with its own
//! worker discipline, and the binary finalization (WAV header
//! synthesis, ADTS framing, PCM segment merging) that produces the
//! output file. Capture devices and MP3/AAC codecs plug in at trait
//! boundaries; a CPAL-backed microphone source is built in.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use record_audio::{RecordConfig, RecordEvent, RecordFormat, RecordSession};
//!
//! let mut session = RecordSession::builder()
//!     .temp_dir("/tmp/myapp")
//!     .on_event(|event| match event {
//!         RecordEvent::Complete(path) => println!("saved {}", path.display()),
//!         RecordEvent::Error(reason) => eprintln!("recording error: {reason}"),
//!         _ => {}
//!     })
//!     .build();
//!
//! session.start("take1.wav", RecordConfig::new(RecordFormat::Wav)).await;
//! // ... later
//! session.pause().await;
//! session.resume().await;
//! session.stop().await; // result file complete when Complete fires
//! ```
//!
//! ## Architecture
//!
//! - **Capture task**: one tokio task per recording segment polls the
//!   [`CaptureSource`] and feeds the active pipeline, checking the
//!   session's atomic state every iteration. Pause and stop are state
//!   writes, never thread interruption, so in-flight audio is always
//!   encoded to completion.
//! - **PCM/WAV**: buffers append to temporary segment files; stop merges
//!   them in capture order and (for WAV) prepends the 44-byte header.
//! - **MP3**: one blocking worker owns the encoder and the result file,
//!   draining a FIFO of sample chunks.
//! - **AAC**: an encode worker (codec + ADTS framing) and a writer
//!   worker run on separate FIFOs, decoupling codec latency from file
//!   I/O latency.
//! - **Events**: all listener callbacks run on one dispatcher task, in
//!   emission order, never overlapping.

#![warn(missing_docs)]
// Audio code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod buffer;
mod config;
pub mod encode;
mod error;
mod event;
mod session;
pub mod source;
mod state;

pub use buffer::CaptureBuffer;
pub use config::{RecordConfig, RecordFormat};
pub use encode::{AacEncoder, AacEncoderFactory, Mp3Encoder, Mp3EncoderFactory};
pub use error::{EncodeError, RecordError};
pub use event::{event_callback, EventCallback, RecordEvent};
pub use session::{RecordSession, RecordSessionBuilder};
pub use source::{CaptureSource, CpalSource, MockSource, SourceFactory};
pub use state::RecordState;
