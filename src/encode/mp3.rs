//! MP3 encode pipeline.
//!
//! A single blocking worker owns the software encoder and the result
//! file. Raw sample chunks arrive through an unbounded FIFO and are
//! encoded in arrival order; the encoded bytes go straight to the result
//! file. Stop is delivered as a finish sentinel so the worker drains its
//! queue and flushes the encoder tail before closing - no encoded tail
//! is ever lost on stop.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};

use crate::encode::Mp3Encoder;
use crate::{EncodeError, RecordError};

enum Mp3Job {
    /// One capture read's worth of samples; the vector length is the
    /// valid sample count (the final chunk is usually short).
    Pcm(Vec<i16>),
    Finish,
}

pub(crate) struct Mp3Pipeline {
    tx: mpsc::UnboundedSender<Mp3Job>,
    worker: Option<JoinHandle<()>>,
    done: Option<oneshot::Receiver<Result<(), EncodeError>>>,
}

impl Mp3Pipeline {
    /// Creates the result file and spawns the encode worker.
    ///
    /// File creation happens up front so a bad result path is a setup
    /// error rather than a mid-recording fault.
    pub(crate) async fn spawn(
        encoder: Box<dyn Mp3Encoder>,
        result: PathBuf,
    ) -> Result<Self, RecordError> {
        let create_path = result.clone();
        let file = task::spawn_blocking(move || {
            File::create(&create_path).map_err(|e| RecordError::file(create_path.clone(), e))
        })
        .await
        .map_err(|e| RecordError::Backend(e.to_string()))??;

        let (tx, rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        let worker = task::spawn_blocking(move || {
            let outcome = run_encode_loop(encoder, file, &result, rx);
            if let Err(ref e) = outcome {
                tracing::error!("mp3 worker fault: {e}");
            }
            let _ = done_tx.send(outcome);
            // encoder and file drop here - released exactly once
            tracing::debug!("mp3 worker exiting");
        });

        Ok(Self {
            tx,
            worker: Some(worker),
            done: Some(done_rx),
        })
    }

    /// Queues one chunk of samples for encoding.
    pub(crate) fn feed(&self, samples: Vec<i16>) -> Result<(), EncodeError> {
        self.tx
            .send(Mp3Job::Pcm(samples))
            .map_err(|_| EncodeError::QueueClosed)
    }

    /// Sends the finish sentinel and waits for the worker to drain,
    /// flush the encoder tail, and close the file.
    pub(crate) async fn finalize(mut self) -> Result<(), EncodeError> {
        let _ = self.tx.send(Mp3Job::Finish);

        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }

        match self.done.take() {
            Some(done) => done
                .await
                .unwrap_or_else(|_| Err(EncodeError::Task("mp3 worker dropped".to_string()))),
            None => Ok(()),
        }
    }
}

/// The worker loop: blocking FIFO pop, encode in arrival order, write
/// directly to the result file.
fn run_encode_loop(
    mut encoder: Box<dyn Mp3Encoder>,
    mut file: File,
    result: &Path,
    mut rx: mpsc::UnboundedReceiver<Mp3Job>,
) -> Result<(), EncodeError> {
    while let Some(job) = rx.blocking_recv() {
        match job {
            Mp3Job::Pcm(samples) => {
                let bytes = encoder.encode(&samples)?;
                if !bytes.is_empty() {
                    file.write_all(&bytes)
                        .map_err(|e| EncodeError::file(result, e))?;
                }
            }
            Mp3Job::Finish => {
                let tail = encoder.finish()?;
                if !tail.is_empty() {
                    file.write_all(&tail)
                        .map_err(|e| EncodeError::file(result, e))?;
                }
                file.flush().map_err(|e| EncodeError::file(result, e))?;
                return Ok(());
            }
        }
    }
    // Channel closed without a sentinel: the session was dropped.
    Ok(())
}
